use axum::http::HeaderMap;
use axum::http::header::ACCEPT;

/// Representations a handler is able to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Html,
}

impl MediaType {
    const fn essence(self) -> (&'static str, &'static str) {
        match self {
            Self::Json => ("application", "json"),
            Self::Html => ("text", "html"),
        }
    }
}

#[derive(Debug)]
struct AcceptEntry<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f32,
    position: usize,
}

struct Ranked {
    quality: f32,
    specificity: u8,
    position: usize,
    index: usize,
    media: MediaType,
}

impl AcceptEntry<'_> {
    /// 2 for an exact match, 1 for `type/*`, 0 for `*/*`.
    fn specificity(&self, (kind, subtype): (&str, &str)) -> Option<u8> {
        let kind_matches = self.kind == "*" || self.kind.eq_ignore_ascii_case(kind);
        let subtype_matches = self.subtype == "*" || self.subtype.eq_ignore_ascii_case(subtype);
        if !(kind_matches && subtype_matches) {
            return None;
        }

        Some(u8::from(self.kind != "*") + u8::from(self.subtype != "*"))
    }
}

/// Picks the representation the client prefers among `offered`.
///
/// Each offer is matched against its most specific Accept entry. Offers
/// are then ranked by that entry's quality, its specificity, where it
/// appears in the header, and finally their order in `offered`. A request
/// without an Accept header takes the first offer; an empty one accepts
/// nothing. Returns `None` when nothing offered is acceptable.
pub fn negotiate(headers: &HeaderMap, offered: &[MediaType]) -> Option<MediaType> {
    if !headers.contains_key(ACCEPT) {
        return offered.first().copied();
    }

    let header = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");

    let entries = parse_accept(&header);

    offered
        .iter()
        .enumerate()
        .filter_map(|(index, media)| {
            let (specificity, entry) = entries
                .iter()
                .filter_map(|entry| Some((entry.specificity(media.essence())?, entry)))
                .max_by(|(a, a_entry), (b, b_entry)| {
                    a.cmp(b).then(b_entry.position.cmp(&a_entry.position))
                })?;
            (entry.quality > 0.0).then_some(Ranked {
                quality: entry.quality,
                specificity,
                position: entry.position,
                index,
                media: *media,
            })
        })
        .max_by(|a, b| {
            a.quality
                .total_cmp(&b.quality)
                .then(a.specificity.cmp(&b.specificity))
                .then(b.position.cmp(&a.position))
                .then(b.index.cmp(&a.index))
        })
        .map(|ranked| ranked.media)
}

fn parse_accept(header: &str) -> Vec<AcceptEntry<'_>> {
    header
        .split(',')
        .enumerate()
        .filter_map(|(position, range)| {
            let mut params = range.split(';');
            let (kind, subtype) = params.next()?.trim().split_once('/')?;
            let (kind, subtype) = (kind.trim(), subtype.trim());
            if kind.is_empty() || subtype.is_empty() {
                return None;
            }

            let quality = params
                .filter_map(|param| param.split_once('='))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
                .map_or(Some(1.0), |(_, value)| value.trim().parse::<f32>().ok())?
                .clamp(0.0, 1.0);

            Some(AcceptEntry {
                kind,
                subtype,
                quality,
                position,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const OFFERED: &[MediaType] = &[MediaType::Json, MediaType::Html];

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_takes_first_offer() {
        assert_eq!(negotiate(&HeaderMap::new(), OFFERED), Some(MediaType::Json));
    }

    #[test]
    fn exact_types() {
        assert_eq!(negotiate(&accept("application/json"), OFFERED), Some(MediaType::Json));
        assert_eq!(negotiate(&accept("text/html"), OFFERED), Some(MediaType::Html));
    }

    #[test]
    fn wildcard_prefers_offer_order() {
        assert_eq!(negotiate(&accept("*/*"), OFFERED), Some(MediaType::Json));
        assert_eq!(negotiate(&accept("text/*"), OFFERED), Some(MediaType::Html));
    }

    #[test]
    fn browser_header_picks_html() {
        let headers = accept(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,*/*;q=0.8",
        );
        assert_eq!(negotiate(&headers, OFFERED), Some(MediaType::Html));
    }

    #[test]
    fn quality_outranks_position() {
        let headers = accept("application/json;q=0.5, text/html");
        assert_eq!(negotiate(&headers, OFFERED), Some(MediaType::Html));
    }

    #[test]
    fn equal_quality_follows_header_order() {
        let headers = accept("text/html, application/json");
        assert_eq!(negotiate(&headers, OFFERED), Some(MediaType::Html));
    }

    #[test]
    fn empty_header_accepts_nothing() {
        assert_eq!(negotiate(&accept(""), OFFERED), None);
        assert_eq!(negotiate(&accept("  "), OFFERED), None);
    }

    #[test]
    fn specific_range_outranks_earlier_wildcard() {
        assert_eq!(negotiate(&accept("*/*, text/html"), OFFERED), Some(MediaType::Html));
        let headers = accept("text/*, application/json");
        assert_eq!(negotiate(&headers, OFFERED), Some(MediaType::Json));
    }

    #[test]
    fn specificity_does_not_beat_quality() {
        let headers = accept("*/*, text/html;q=0.5");
        assert_eq!(negotiate(&headers, OFFERED), Some(MediaType::Json));
    }

    #[test]
    fn specific_zero_quality_excludes_despite_wildcard() {
        let headers = accept("application/json;q=0, */*");
        assert_eq!(negotiate(&headers, OFFERED), Some(MediaType::Html));
    }

    #[test]
    fn unsupported_types_are_not_acceptable() {
        assert_eq!(negotiate(&accept("application/xml"), OFFERED), None);
        assert_eq!(negotiate(&accept("image/png, text/plain"), OFFERED), None);
    }

    #[test]
    fn malformed_ranges_are_ignored() {
        assert_eq!(negotiate(&accept("garbage, text/html;q=abc"), OFFERED), None);
        assert_eq!(negotiate(&accept("garbage, text/html"), OFFERED), Some(MediaType::Html));
    }
}
