//! Route matching module
//!
//! Implements the framework's route id syntax:
//! - literal segments (`/blog`)
//! - `[param]`: exactly one segment
//! - `[[optional]]`: zero or one segment
//! - `[...rest]`: zero or more segments
//! - `(group)`: layout groups, not part of the URL

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Optional,
    Rest,
}

/// A parsed route id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    id: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(id: &str) -> Self {
        let segments = id
            .split('/')
            .filter(|s| !s.is_empty())
            .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
            .map(|s| {
                if s.starts_with("[[") && s.ends_with("]]") {
                    Segment::Optional
                } else if s.starts_with("[...") && s.ends_with(']') {
                    Segment::Rest
                } else if s.contains('[') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self {
            id: id.to_string(),
            segments,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check if a decoded path matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(segments: &[Segment], parts: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return parts.is_empty();
    };
    match first {
        Segment::Literal(literal) => {
            parts.first() == Some(&literal.as_str()) && match_segments(rest, &parts[1..])
        }
        Segment::Param => !parts.is_empty() && match_segments(rest, &parts[1..]),
        Segment::Optional => {
            match_segments(rest, parts) || (!parts.is_empty() && match_segments(rest, &parts[1..]))
        }
        Segment::Rest => (0..=parts.len()).any(|n| match_segments(rest, &parts[n..])),
    }
}

/// Find the first matching route for a given path
pub fn match_route<'a>(path: &str, routes: &'a [RoutePattern]) -> Option<&'a RoutePattern> {
    routes.iter().find(|route| route.matches(path))
}
