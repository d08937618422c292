//! 見出し風メッセージの自動ハイライト判定

/// 前後の空白を除いた本文が `#` + 空白 + 1 文字以上 で始まるか
///
/// `"# Title"` → true, `"#Title"` → false, `"#   "` → false
pub fn looks_like_heading(text: &str) -> bool {
    let Some(rest) = text.trim().strip_prefix('#') else {
        return false;
    };
    rest.starts_with(char::is_whitespace) && !rest.trim_start().is_empty()
}

/// 最終的なハイライトフラグ（明示指定 OR 見出し判定）
pub fn resolve_highlight(text: &str, requested: bool) -> bool {
    requested || looks_like_heading(text)
}
