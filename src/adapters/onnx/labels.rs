//! Model label table, read from the `names` metadata entry written by the YOLO exporter.
//!
//! The exporter stores a Python dict literal: `{0: 'person', 1: 'bicycle', ...}`.

/// Class index → name mapping owned by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parses the exporter's dict literal. Returns `None` if nothing usable is found.
    pub fn from_metadata(raw: &str) -> Option<Self> {
        let pairs = parse_index_map(raw)?;
        let max = pairs.iter().map(|(i, _)| *i).max()?;

        let mut names: Vec<String> = (0..=max).map(|i| format!("class_{i}")).collect();
        for (idx, name) in pairs {
            names[idx] = name;
        }
        Some(Self { names })
    }

    pub fn resolve(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn parse_index_map(raw: &str) -> Option<Vec<(usize, String)>> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut chars = body.chars().peekable();
    let mut out = Vec::new();

    loop {
        skip_ws_and(&mut chars, ',');
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.peek().copied().filter(|c| c.is_ascii_digit()) {
            key.push(c);
            chars.next();
        }
        let idx: usize = key.parse().ok()?;

        skip_ws_and(&mut chars, ' ');
        if chars.next()? != ':' {
            return None;
        }
        skip_ws_and(&mut chars, ' ');

        let quote = chars.next().filter(|c| *c == '\'' || *c == '"')?;
        let mut name = String::new();
        loop {
            match chars.next()? {
                '\\' => name.push(chars.next()?),
                c if c == quote => break,
                c => name.push(c),
            }
        }
        out.push((idx, name));
    }

    (!out.is_empty()).then_some(out)
}

fn skip_ws_and(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, extra: char) {
    while chars.peek().is_some_and(|c| c.is_whitespace() || *c == extra) {
        chars.next();
    }
}
