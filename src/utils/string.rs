use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("净化正则"));
static FEAT_BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[(\[【][^)\]】]*?(?:feat\.|ft\.|featuring)[^)\]】]*[)\]】]").expect("feat 正则")
});
static FEAT_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:feat\.|ft\.|featuring).*").expect("feat 正则"));
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[–—−－]").expect("破折号正则"));
static JP_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^『]*『([^』]+)』").expect("书名号正则"));
static HALF_WIDTH_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("括号正则"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(\[【].*?[)\]】]").expect("括号正则"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[|/]").expect("分隔符正则"));
static JP_QUOTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[『』「」]").expect("引号正则"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("空白正则"));

const ZUTOMAYO: &str = "ずっと真夜中でいいのに。 ZUTOMAYO";

/// 净化字符串，移除特殊字符，用于歌曲匹配
pub fn sanitize_string(input: &str) -> String {
    let result = NON_WORD.replace_all(input, "");
    SPACES.replace_all(result.trim(), " ").to_lowercase()
}

/// 比较两个字符串的相似度
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let a_clean = sanitize_string(a);
    let b_clean = sanitize_string(b);

    if a_clean.is_empty() || b_clean.is_empty() {
        return 0.0;
    }

    strsim::normalized_levenshtein(&a_clean, &b_clean)
}

fn collapse_spaces(input: &str) -> String {
    SPACES.replace_all(input, " ").trim().to_string()
}

/// 标题规范化
///
/// 视频站/浏览器播放器的标题常带有“艺术家 - 标题 [MV]”之类的装饰，
/// 需要在生成缓存键和搜索之前剥掉；Spotify 的标题比较干净，只去掉 feat. 部分。
#[derive(Debug, Clone, Default)]
pub struct TitleNormalizer;

impl TitleNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 返回规范化后的 (标题, 艺术家)
    pub fn canonicalize(&self, title: &str, artist: &str, player: &str) -> (String, String) {
        // ZUTOMAYO：只取『』中的标题，保留「」，去掉半角括号
        if artist.contains(ZUTOMAYO) {
            if let Some(cap) = JP_TITLE.captures(title) {
                let inner = HALF_WIDTH_PARENS.replace_all(&cap[1], "");
                return (inner.trim().to_string(), artist.to_string());
            }
        }

        if player.to_lowercase().contains("spotify") {
            let title = FEAT_BRACKETED.replace_all(title, "");
            let title = FEAT_TAIL.replace_all(&title, "");
            return (collapse_spaces(&title), artist.to_string());
        }

        let mut title = DASHES.replace_all(title, "-").into_owned();

        // "标题 / 艺术家"
        if let Some((head, _)) = title.split_once(" / ") {
            title = head.to_string();
        }

        // 『』 中的内容通常才是真正的标题
        if let Some(inner) = JP_TITLE.captures(&title).map(|cap| cap[1].to_string()) {
            title = inner;
        }

        // " - " 之后一般是艺术家或附加信息
        if let Some((head, _)) = title.split_once(" - ") {
            title = head.to_string();
        }

        let title = BRACKETED.replace_all(&title, "");
        let title = SEPARATORS.replace_all(&title, " ");
        let title = FEAT_TAIL.replace_all(&title, "");
        let title = JP_QUOTES.replace_all(&title, "");

        (collapse_spaces(&title), artist.to_string())
    }
}

/// 去除艺术家名中的 emoji 与全角字符
pub fn strip_decorative_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            let code = *c as u32;
            !((0x1F000..=0x1FFFF).contains(&code) || (0xFF00..=0xFFEF).contains(&code))
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// 构造歌词搜索关键字
///
/// 有映射时直接使用映射后的艺术家名；否则艺术家名过长（不少于 `max_artist_len` 个字符）
/// 时只按标题搜索，避免搜索条件过严。
pub fn build_search_query(
    title: &str,
    artist: &str,
    mappings: &HashMap<String, String>,
    max_artist_len: usize,
) -> String {
    if let Some(mapped) = mappings.get(artist) {
        return format!("{} {}", title, mapped).trim().to_string();
    }

    let clean_artist = strip_decorative_chars(artist);
    if !clean_artist.is_empty() && clean_artist.chars().count() < max_artist_len {
        format!("{} {}", title, clean_artist).trim().to_string()
    } else {
        title.trim().to_string()
    }
}
