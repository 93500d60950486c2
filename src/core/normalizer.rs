use crate::domain::model::Normalization;

/// Cosmetic/scriptlet markers. A line is split at whichever of these occurs
/// earliest in the string, never by a fixed preference among them.
const MARKERS: [&str; 3] = ["##", "#@#", "#?#"];

/// Hosts-file addresses that mark a line as a blocking entry.
const HOSTS_ADDRESSES: [&str; 2] = ["0.0.0.0", "127.0.0.1"];

/// Classifies one raw line and rewrites it into canonical filter syntax.
///
/// Pure and total: malformed input produces a warning trace and no output,
/// never an error. Already-canonical rules pass through unchanged, so
/// normalizing an output a second time returns it as-is.
///
/// 分類順序：空行 → 註釋 → HOSTS → 多域名 → 其他原樣輸出
pub fn normalize(line: &str) -> Normalization {
    let line = line.trim();
    if line.is_empty() {
        return Normalization::default();
    }

    if is_comment(line) {
        return Normalization {
            outputs: Vec::new(),
            trace: vec![format!("comment dropped: {}", line)],
        };
    }

    if is_hosts_entry(line) {
        return normalize_hosts(line);
    }

    if let Some((idx, marker)) = first_marker(line) {
        if line[..idx].contains(',') {
            return split_domain_list(line, idx, marker);
        }
    }

    Normalization {
        outputs: vec![line.to_string()],
        trace: Vec::new(),
    }
}

fn is_comment(line: &str) -> bool {
    if line.starts_with('!') {
        return true;
    }
    // '#' opens a full-line comment only when the line is not a generic
    // cosmetic rule such as "##.ad" or "#?#div".
    line.starts_with('#') && !MARKERS.iter().any(|m| line.starts_with(m))
}

fn is_hosts_entry(line: &str) -> bool {
    let first = line.split_whitespace().next();
    matches!(first, Some(token) if HOSTS_ADDRESSES.contains(&token))
}

/// Rewrites `<ip> <domain[,domain...]>` into anchored block rules.
fn normalize_hosts(line: &str) -> Normalization {
    let mut tokens = line.split_whitespace();
    let _address = tokens.next();

    let Some(domain_list) = tokens.next() else {
        return Normalization {
            outputs: Vec::new(),
            trace: vec![format!("warning: hosts entry without a domain: {}", line)],
        };
    };

    let mut result = Normalization::default();
    for domain in domain_list.split(',') {
        let domain = domain.trim();
        if domain.is_empty() {
            continue;
        }
        let rule = format!("||{}^", domain);
        result.trace.push(format!("hosts entry rewritten: {} -> {}", domain, rule));
        result.outputs.push(rule);
    }
    result
}

/// Index and text of the earliest marker occurrence, if any.
fn first_marker(line: &str) -> Option<(usize, &'static str)> {
    MARKERS
        .iter()
        .filter_map(|m| line.find(m).map(|idx| (idx, *m)))
        .min_by_key(|&(idx, _)| idx)
}

/// Expands `a.com,b.com##...` into one rule per domain, re-anchoring each.
/// A detected `|` or `||` prefix is preserved; bare domain lists get `||`.
fn split_domain_list(line: &str, marker_idx: usize, marker: &str) -> Normalization {
    let (domain_part, suffix) = line.split_at(marker_idx);

    let (anchor, domain_list) = match domain_part.strip_prefix("||") {
        Some(rest) => ("||", rest),
        None => match domain_part.strip_prefix('|') {
            Some(rest) => ("|", rest),
            None => ("||", domain_part),
        },
    };

    let domains: Vec<&str> = domain_list
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();

    let mut result = Normalization::default();
    result.trace.push(format!(
        "split {} domains before {}: {}",
        domains.len(),
        marker,
        line
    ));

    for domain in domains {
        let rule = format!("{}{}{}", anchor, domain, suffix);
        result.trace.push(format!("emitted: {}", rule));
        result.outputs.push(rule);
    }
    result
}
