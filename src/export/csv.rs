pub const HEADER: [&str; 3] = ["name", "value", "perc"];

/// Minimal comma-separated writer; quotes fields per RFC 4180 when needed.
#[derive(Debug, Default)]
pub struct CsvWriter {
    buf: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_record<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            write_field(&mut self.buf, field.as_ref());
        }
        self.buf.push('\n');
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

fn write_field(buf: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        buf.push('"');
        buf.push_str(&field.replace('"', "\"\""));
        buf.push('"');
    } else {
        buf.push_str(field);
    }
}
