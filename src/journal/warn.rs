fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Parse,
    Upsert,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Discover => "discover",
            Stage::Parse => "parse",
            Stage::Upsert => "upsert",
        }
    }
}

pub struct WarnEvent<'a> {
    pub code: &'a str,
    pub stage: Stage,
    pub file: &'a str,
    pub reason: &'a str,
    pub err: &'a str,
}

pub fn format_event(event: &WarnEvent<'_>) -> String {
    format!(
        "JOURNAL_WARN code={} stage={} file={} reason={} err={}",
        sanitize_value(event.code),
        event.stage.as_str(),
        sanitize_value(event.file),
        sanitize_value(event.reason),
        sanitize_value(event.err),
    )
}

pub fn emit(event: &WarnEvent<'_>) {
    eprintln!("{}", format_event(event));
}
