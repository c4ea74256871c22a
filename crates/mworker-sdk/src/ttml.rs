//! EBU-TTML-live cue parsing.
//!
//! Cue payloads come straight from the subtitle stream and may be truncated
//! or otherwise malformed. Everything here returns
//! [`WorkerError::MalformedTtml`] instead of panicking, so a worker can turn
//! a bad cue into a failure result with `?` and a `map_err`.

use roxmltree::{Document, Node};

use mworker_models::{TimeExpression, TimingParameters};

use crate::error::{WorkerError, WorkerResult};

/// A timed paragraph (`div/p`) with its span texts.
#[derive(Debug, Clone, PartialEq)]
pub struct TtmlParagraph {
    pub id: Option<String>,
    pub begin: Option<TimeExpression>,
    pub end: Option<TimeExpression>,
    pub spans: Vec<String>,
}

/// A `body` element of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct TtmlBody {
    pub attributes: Vec<(String, String)>,
    pub paragraphs: Vec<TtmlParagraph>,
}

/// Parsed EBU-TTML-live document.
#[derive(Debug, Clone, PartialEq)]
pub struct TtmlDocument {
    pub root_tag: String,
    pub attributes: Vec<(String, String)>,
    pub timing: TimingParameters,
    pub bodies: Vec<TtmlBody>,
}

impl TtmlDocument {
    /// All span texts in document order.
    pub fn spans(&self) -> impl Iterator<Item = &str> {
        self.bodies
            .iter()
            .flat_map(|b| b.paragraphs.iter())
            .flat_map(|p| p.spans.iter())
            .map(String::as_str)
    }

    /// Span texts joined by a single space.
    pub fn subtitle_text(&self) -> String {
        self.spans().collect::<Vec<_>>().join(" ")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }
}

impl TtmlBody {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        find_attribute(&self.attributes, name)
    }
}

/// Parse an EBU-TTML-live payload.
pub fn parse(ttml: &str) -> WorkerResult<TtmlDocument> {
    let doc = Document::parse(ttml).map_err(|e| WorkerError::malformed_ttml(e.to_string()))?;
    let root = doc.root_element();

    if root.tag_name().name() != "tt" {
        return Err(WorkerError::malformed_ttml(format!(
            "root element is '{}', expected 'tt'",
            root.tag_name().name()
        )));
    }

    let attributes = attributes_of(root);
    let timing = timing_of(&attributes)?;

    let bodies = child_elements(root, "body")
        .map(parse_body)
        .collect::<WorkerResult<Vec<_>>>()?;

    Ok(TtmlDocument {
        root_tag: root.tag_name().name().to_string(),
        attributes,
        timing,
        bodies,
    })
}

fn parse_body(body: Node<'_, '_>) -> WorkerResult<TtmlBody> {
    let paragraphs = child_elements(body, "div")
        .flat_map(|div| child_elements(div, "p"))
        .map(parse_paragraph)
        .collect::<WorkerResult<Vec<_>>>()?;

    Ok(TtmlBody {
        attributes: attributes_of(body),
        paragraphs,
    })
}

fn parse_paragraph(p: Node<'_, '_>) -> WorkerResult<TtmlParagraph> {
    let spans = child_elements(p, "span")
        .map(|span| {
            span.descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect::<String>()
        })
        .collect();

    Ok(TtmlParagraph {
        id: p
            .attributes()
            .find(|a| a.name() == "id")
            .map(|a| a.value().to_string()),
        begin: parse_time_attribute(p, "begin")?,
        end: parse_time_attribute(p, "end")?,
        spans,
    })
}

fn parse_time_attribute(node: Node<'_, '_>, name: &str) -> WorkerResult<Option<TimeExpression>> {
    node.attribute(name)
        .map(|value| {
            value
                .parse::<TimeExpression>()
                .map_err(|e| WorkerError::malformed_ttml(e.to_string()))
        })
        .transpose()
}

fn timing_of(attributes: &[(String, String)]) -> WorkerResult<TimingParameters> {
    let mut timing = TimingParameters::default();

    if let Some(rate) = find_attribute(attributes, "frameRate") {
        timing.frame_rate = parse_positive(rate, "frameRate")?;
    }
    if let Some(rate) = find_attribute(attributes, "subFrameRate") {
        timing.sub_frame_rate = parse_positive(rate, "subFrameRate")?;
    }
    if let Some(rate) = find_attribute(attributes, "tickRate") {
        timing.tick_rate = parse_positive(rate, "tickRate")?;
    }

    Ok(timing)
}

fn parse_positive<T>(value: &str, name: &str) -> WorkerResult<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(WorkerError::malformed_ttml(format!(
            "invalid {} '{}'",
            name, value
        ))),
    }
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    local_name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == local_name)
}

fn attributes_of(node: Node<'_, '_>) -> Vec<(String, String)> {
    node.attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect()
}

fn find_attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mworker_models::Frames;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tt xmlns="http://www.w3.org/ns/ttml"
    xmlns:ttp="http://www.w3.org/ns/ttml#parameter"
    ttp:frameRate="25" xml:lang="en">
  <body dur="00:00:10">
    <div>
      <p xml:id="sub1" begin="00:00:01:05" end="00:00:03:00">
        <span>Hello</span>
        <span>world<br/>again</span>
      </p>
    </div>
  </body>
</tt>"#;

    #[test]
    fn test_parse_sample() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.root_tag, "tt");
        assert_eq!(doc.timing.frame_rate, 25.0);
        assert_eq!(doc.attribute("lang"), Some("en"));
        assert_eq!(doc.bodies.len(), 1);
        assert_eq!(doc.bodies[0].attribute("dur"), Some("00:00:10"));

        let p = &doc.bodies[0].paragraphs[0];
        assert_eq!(p.id.as_deref(), Some("sub1"));
        assert_eq!(
            p.begin,
            Some(TimeExpression::ClockTime {
                hours: 0,
                minutes: 0,
                seconds: 1,
                frames: Frames::new(5),
            })
        );
        assert_eq!(doc.subtitle_text(), "Hello worldagain");
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse("<tt><body><div><p><span>unterminated").unwrap_err();
        assert!(matches!(err, WorkerError::MalformedTtml(_)));
        assert!(parse("").is_err());
        assert!(parse("not xml at all").is_err());
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            parse("<html><body/></html>"),
            Err(WorkerError::MalformedTtml(_))
        ));
    }

    #[test]
    fn test_invalid_time_attribute() {
        let ttml = r#"<tt><body><div><p begin="soon"><span>x</span></p></div></body></tt>"#;
        assert!(matches!(parse(ttml), Err(WorkerError::MalformedTtml(_))));
    }

    #[test]
    fn test_invalid_frame_rate() {
        assert!(parse(r#"<tt frameRate="0"/>"#).is_err());
    }

    #[test]
    fn test_sub_frame_times() {
        let ttml = r#"<tt ttp:frameRate="25" ttp:subFrameRate="2"
            xmlns:ttp="http://www.w3.org/ns/ttml#parameter">
            <body><div><p begin="00:00:01:05.1" end="00:00:02:00.1"><span>x</span></p></div></body>
        </tt>"#;
        let doc = parse(ttml).unwrap();
        assert_eq!(doc.timing.sub_frame_rate, 2);

        let p = &doc.bodies[0].paragraphs[0];
        assert_eq!(
            p.begin,
            Some(TimeExpression::ClockTime {
                hours: 0,
                minutes: 0,
                seconds: 1,
                frames: Frames::new(5).with_sub_frames(1),
            })
        );
    }

    #[test]
    fn test_fractional_sub_frame_rate_is_rejected() {
        assert!(matches!(
            parse(r#"<tt subFrameRate="0.5"/>"#),
            Err(WorkerError::MalformedTtml(_))
        ));
        assert!(parse(r#"<tt subFrameRate="0"/>"#).is_err());
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("<tt/>").unwrap();
        assert!(doc.bodies.is_empty());
        assert_eq!(doc.subtitle_text(), "");
    }
}
