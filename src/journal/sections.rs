/// Heading prefix that opens a subsection.
const SECTION_MARKER: &str = "## ";
const HIGH_PREFIX: &str = "high:";
const LOW_PREFIX: &str = "low:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Morning,
    Afternoon,
    Night,
    Highlights,
    Lowlights,
}

/// Label words in match order. Longer words precede their own prefixes so
/// `highlights` is stripped whole rather than leaving `lights`.
const VOCABULARY: [(&str, SectionKind); 8] = [
    ("morning", SectionKind::Morning),
    ("afternoon", SectionKind::Afternoon),
    ("night", SectionKind::Night),
    ("evening", SectionKind::Night),
    ("highlights", SectionKind::Highlights),
    ("high", SectionKind::Highlights),
    ("lowlights", SectionKind::Lowlights),
    ("low", SectionKind::Lowlights),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub morning: Option<String>,
    pub afternoon: Option<String>,
    pub night: Option<String>,
    pub highlights_high: Option<String>,
    pub highlights_low: Option<String>,
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn classify(chunk: &str) -> Option<(SectionKind, &str)> {
    VOCABULARY.iter().find_map(|(label, kind)| {
        strip_prefix_ignore_case(chunk, label).map(|rest| (*kind, rest))
    })
}

/// Chunks of text that follow each `## ` heading, heading remainder included.
/// Text before the first heading belongs to no section.
fn split_chunks(body: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Option<String> = None;
    for line in body.lines() {
        if let Some(heading) = line.strip_prefix(SECTION_MARKER) {
            if let Some(done) = current.take() {
                chunks.push(done);
            }
            current = Some(heading.to_string());
        } else if let Some(chunk) = current.as_mut() {
            chunk.push('\n');
            chunk.push_str(line);
        }
    }
    chunks.extend(current);
    chunks
}

fn summary_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .unwrap_or(line)
                .trim()
        })
        .filter(|line| !line.is_empty())
}

fn section_text(rest: &str) -> &str {
    rest.trim_start_matches(':').trim()
}

/// Classify every `## ` chunk of `body` into the fixed journal sections.
///
/// Free-text sections keep their full text minus the label word. Highlight
/// sections keep one line: the first line not starting with `Low:`, minus a
/// `High:` prefix. `Low:` lines and `## Low` sections fill `highlights_low`.
/// A later non-empty section overrides an earlier one.
pub fn parse_sections(body: &str) -> Sections {
    let mut out = Sections::default();

    for chunk in split_chunks(body) {
        let chunk = chunk.trim();
        let Some((kind, rest)) = classify(chunk) else {
            continue;
        };
        let text = section_text(rest);

        match kind {
            SectionKind::Morning => set(&mut out.morning, non_empty(text)),
            SectionKind::Afternoon => set(&mut out.afternoon, non_empty(text)),
            SectionKind::Night => set(&mut out.night, non_empty(text)),
            SectionKind::Highlights => {
                let mut high = None;
                for line in summary_lines(text) {
                    if let Some(low) = strip_prefix_ignore_case(line, LOW_PREFIX) {
                        set(&mut out.highlights_low, non_empty(low));
                    } else if high.is_none() {
                        high = non_empty(strip_prefix_ignore_case(line, HIGH_PREFIX).unwrap_or(line));
                    }
                }
                set(&mut out.highlights_high, high);
            }
            SectionKind::Lowlights => {
                let low = summary_lines(text).next().and_then(|line| {
                    non_empty(strip_prefix_ignore_case(line, LOW_PREFIX).unwrap_or(line))
                });
                set(&mut out.highlights_low, low);
            }
        }
    }

    out
}

fn set(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}
