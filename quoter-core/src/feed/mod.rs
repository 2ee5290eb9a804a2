//! Reference price feed
//!
//! The feed is an external process writing line-delimited records such as
//! `{"midprice":1.08455,"ts":1700000000}` to stdout. This module turns that
//! byte stream into prices with no per-line allocation:
//!
//! - `line`: `LineAssembler`, bounded reassembly of lines across reads
//! - `extract`: `FieldExtractor`, single-key numeric micro-parser
//! - `ingester`: `FeedIngester`, process lifecycle + pinned read loop

pub mod extract;
pub mod ingester;
pub mod line;

pub use extract::{FieldExtractor, KeyExtractor, MIDPRICE_KEY, MIN_RECORD_LEN};
pub use ingester::{
    latest_in_chunk, run_read_loop, FeedIngester, PriceListener, ReadLoopStats, TERMINATE_GRACE,
};
pub use line::{LineAssembler, Lines, MAX_LINE_LEN};
