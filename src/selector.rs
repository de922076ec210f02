use super::*;

// Plan element names are Java class names, so `.` belongs to the tag name and
// there are no class or id shorthands.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::Selector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        if token == ">" {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::Selector(selector.into()));
            }
            pending_combinator = Some(SelectorCombinator::Child);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::Selector(selector.into()));
    }

    Ok(steps)
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_outside_brackets(selector, |ch| ch == ',', false)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        if group.is_empty() {
            return Err(Error::Selector(selector.into()));
        }
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let spaced = split_outside_brackets(selector, |ch| ch.is_ascii_whitespace(), true)?;
    let mut tokens = Vec::new();
    for chunk in spaced {
        let mut current = String::new();
        let mut depth = 0usize;
        for ch in chunk.chars() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if ch == '>' && depth == 0 {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            } else {
                current.push(ch);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    Ok(tokens)
}

// Splits on `is_sep` while outside `[...]` and quotes.
fn split_outside_brackets(
    selector: &str,
    is_sep: impl Fn(char) -> bool,
    skip_empty: bool,
) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::Selector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ch if bracket_depth == 0 && is_sep(ch) => {
                let trimmed = current.trim().to_string();
                if !(skip_empty && trimmed.is_empty()) {
                    parts.push(trimmed);
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || quote.is_some() {
        return Err(Error::Selector(selector.into()));
    }
    let trimmed = current.trim().to_string();
    if !(skip_empty && trimmed.is_empty()) {
        parts.push(trimmed);
    }
    Ok(parts)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();
    let mut universal = false;

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if universal || step.tag.is_some() || !step.attrs.is_empty() {
                    return Err(Error::Selector(part.into()));
                }
                universal = true;
                i += 1;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            _ => {
                if step.tag.is_some() || universal || !step.attrs.is_empty() {
                    return Err(Error::Selector(part.into()));
                }
                let Some((tag, next)) = parse_selector_ident(part, i) else {
                    return Err(Error::Selector(part.into()));
                };
                step.tag = Some(tag);
                i = next;
            }
        }
    }

    if step.tag.is_none() && step.attrs.is_empty() && !universal {
        return Err(Error::Selector(part.into()));
    }
    Ok(step)
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_selector_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

fn parse_selector_attr_condition(
    src: &str,
    open_bracket: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = skip_ws(bytes, open_bracket + 1);

    let key_start = i;
    while i < bytes.len() && is_selector_attr_name_char(bytes[i]) {
        i += 1;
    }
    if key_start == i {
        return Err(Error::Selector(src.into()));
    }
    let key = src
        .get(key_start..i)
        .ok_or_else(|| Error::Selector(src.into()))?
        .to_string();

    i = skip_ws(bytes, i);
    match bytes.get(i) {
        Some(b']') => return Ok((SelectorAttrCondition::Exists { key }, i + 1)),
        Some(b'=') => i += 1,
        _ => return Err(Error::Selector(src.into())),
    }

    i = skip_ws(bytes, i);
    let (value, next) = parse_selector_attr_value(src, i)?;
    i = skip_ws(bytes, next);
    if bytes.get(i) != Some(&b']') {
        return Err(Error::Selector(src.into()));
    }
    Ok((SelectorAttrCondition::Eq { key, value }, i + 1))
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn is_selector_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.')
}

fn parse_selector_attr_value(src: &str, start: usize) -> Result<(String, usize)> {
    let bytes = src.as_bytes();
    match bytes.get(start) {
        Some(&quote @ (b'"' | b'\'')) => {
            let body_start = start + 1;
            let Some(len) = bytes[body_start..].iter().position(|b| *b == quote) else {
                return Err(Error::Selector(src.into()));
            };
            let value = src
                .get(body_start..body_start + len)
                .ok_or_else(|| Error::Selector(src.into()))?;
            Ok((value.to_string(), body_start + len + 1))
        }
        Some(_) => {
            let mut i = start;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b']' {
                i += 1;
            }
            let value = src
                .get(start..i)
                .ok_or_else(|| Error::Selector(src.into()))?;
            Ok((value.to_string(), i))
        }
        None => Err(Error::Selector(src.into())),
    }
}
