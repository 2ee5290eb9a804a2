//! Single-field micro-parser for price records
//!
//! Feed lines look like `{"midprice":101.5,"ts":1}`. Nothing else in the
//! record matters, so instead of decoding JSON the extractor finds one key
//! and parses the number behind it.

/// Lines of this length or shorter are never price records
pub const MIN_RECORD_LEN: usize = 20;

/// Key of the reference price in feed records
pub const MIDPRICE_KEY: &[u8] = b"\"midprice\":";

/// Pulls one numeric value out of a completed line
///
/// `None` means "no value" and is distinct from any price: callers must not
/// turn it into zero or into the previous price.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, line: &[u8]) -> Option<f64>;
}

/// Substring-scan extractor for a single object key
#[derive(Debug, Clone, Copy)]
pub struct KeyExtractor {
    key: &'static [u8],
}

impl KeyExtractor {
    pub const fn new(key: &'static [u8]) -> Self {
        Self { key }
    }

    /// Extractor for the `"midprice":` field
    pub const fn midprice() -> Self {
        Self::new(MIDPRICE_KEY)
    }

    pub fn key(&self) -> &'static [u8] {
        self.key
    }
}

impl Default for KeyExtractor {
    fn default() -> Self {
        Self::midprice()
    }
}

impl FieldExtractor for KeyExtractor {
    #[inline]
    fn extract(&self, line: &[u8]) -> Option<f64> {
        if line.len() <= MIN_RECORD_LEN || line[0] != b'{' {
            return None;
        }

        let key_at = find(line, self.key)?;
        let value = &line[key_at + self.key.len()..];

        // Value runs to whichever of ',' or '}' comes first
        let end = value.iter().position(|&b| b == b',' || b == b'}')?;
        if end == 0 {
            return None;
        }

        parse_price(&value[..end])
    }
}

#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let first = needle[0];
    let last_start = haystack.len() - needle.len();
    let mut i = 0;
    while i <= last_start {
        match haystack[i..=last_start].iter().position(|&b| b == first) {
            Some(offset) => {
                let start = i + offset;
                if &haystack[start..start + needle.len()] == needle {
                    return Some(start);
                }
                i = start + 1;
            }
            None => return None,
        }
    }
    None
}

#[inline]
fn parse_price(raw: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(raw).ok()?.trim();
    let value: f64 = text.parse().ok()?;
    value.is_finite().then_some(value)
}
