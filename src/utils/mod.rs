// 工具模块

mod fs;
mod lrc;
mod string;

pub use fs::write_atomic;
pub use lrc::{LrcLine, LrcParser};
pub use string::{
    build_search_query, sanitize_string, string_similarity, strip_decorative_chars,
    TitleNormalizer,
};
