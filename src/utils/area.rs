// utils/area.rs
//
// Area names are stored in canonical form. `normalize_area` is applied once
// when a value is recorded; comparisons run on canonical strings.

/// Areas a profile or job may name, already in canonical form.
pub const SERVICE_AREAS: &[&str] = &[
    "תל אביב",
    "ירושלים",
    "חיפה",
    "פתח תקוה",
    "ראשון לציון",
    "רמת גן",
    "גבעתיים",
    "חולון",
    "בת ים",
    "בני ברק",
    "הרצליה",
    "רעננה",
    "כפר סבא",
    "הוד השרון",
    "נתניה",
    "רחובות",
    "נס ציונה",
    "מודיעין",
    "אשדוד",
    "באר שבע",
];

const QUOTE_MARKS: &[char] = &['\'', '"', '`', '׳', '״', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// Collapses orthographic variants of a city name: quote marks dropped,
/// hyphens to spaces, a doubled vav (or doubled latin letter) reduced to one,
/// whitespace collapsed. Idempotent.
pub fn normalize_area(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if QUOTE_MARKS.contains(&ch) {
            continue;
        }
        let ch = match ch {
            '-' | '\u{05BE}' | '_' => ' ',
            other => other,
        };
        for lower in ch.to_lowercase() {
            cleaned.push(lower);
        }
    }

    let mut out = String::with_capacity(cleaned.len());
    let mut prev: Option<char> = None;
    for ch in cleaned.chars() {
        if let Some(p) = prev {
            if p == ch && (ch.is_whitespace() || collapses_when_doubled(ch)) {
                continue;
            }
        }
        let ch = if ch.is_whitespace() { ' ' } else { ch };
        if ch == ' ' && prev == Some(' ') {
            continue;
        }
        out.push(ch);
        prev = Some(ch);
    }

    out.trim().to_string()
}

fn collapses_when_doubled(ch: char) -> bool {
    ch == 'ו' || ch.is_ascii_alphabetic()
}

/// Resolves user input to a catalog area, by menu number (1-based) or name.
pub fn resolve_area(input: &str) -> Option<&'static str> {
    let trimmed = input.trim();
    if let Ok(index) = trimmed.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| SERVICE_AREAS.get(i))
            .copied();
    }

    let wanted = normalize_area(trimmed);
    SERVICE_AREAS
        .iter()
        .copied()
        .find(|area| normalize_area(area) == wanted)
}

/// Substring containment of the job's area inside the provider's joined list.
pub fn area_matches(job_area: &str, provider_areas: &str) -> bool {
    let needle = normalize_area(job_area);
    if needle.is_empty() {
        return false;
    }
    provider_areas.contains(&needle)
}

/// Appends `area` to a comma-joined list unless already present.
pub fn append_area(existing: Option<&str>, area: &str) -> String {
    let mut areas: Vec<&str> = existing
        .map(|joined| {
            joined
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !areas.contains(&area) {
        areas.push(area);
    }
    areas.join(",")
}

pub fn area_menu() -> String {
    SERVICE_AREAS
        .iter()
        .enumerate()
        .map(|(i, area)| format!("{}. {}", i + 1, area))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spelling_variants_collapse() {
        assert_eq!(normalize_area("פתח תקווה"), "פתח תקוה");
        assert_eq!(normalize_area("פתח תקוה"), "פתח תקוה");
        assert_eq!(normalize_area("תל-אביב"), "תל אביב");
        assert_eq!(normalize_area("  ראשון   לציון "), "ראשון לציון");
        assert_eq!(normalize_area("קרית \"גת\""), "קרית גת");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["פתח תקווה", "Tel--Aviv", "רמת  גן", "גבעתיים"] {
            let once = normalize_area(raw);
            assert_eq!(normalize_area(&once), once);
        }
        for area in SERVICE_AREAS {
            assert_eq!(normalize_area(area), *area);
        }
    }

    #[test]
    fn test_matching_is_symmetric_across_spellings() {
        let provider_areas = append_area(Some("חולון"), &normalize_area("פתח תקווה"));
        assert!(area_matches("פתח תקווה", &provider_areas));
        assert!(area_matches("פתח תקוה", &provider_areas));
        assert!(!area_matches("חיפה", &provider_areas));
    }

    #[test]
    fn test_resolve_by_number_or_name() {
        assert_eq!(resolve_area("1"), Some("תל אביב"));
        assert_eq!(resolve_area("תל-אביב"), Some("תל אביב"));
        assert_eq!(resolve_area("פתח תקווה"), Some("פתח תקוה"));
        assert_eq!(resolve_area("0"), None);
        assert_eq!(resolve_area("999"), None);
        assert_eq!(resolve_area("אילת"), None);
    }

    #[test]
    fn test_append_dedupes() {
        let areas = append_area(None, "חולון");
        let areas = append_area(Some(&areas), "בת ים");
        let areas = append_area(Some(&areas), "חולון");
        assert_eq!(areas, "חולון,בת ים");
    }
}
