//! Filter Key Module
//!
//! Canonical string encoding of query filters, used to partition paged
//! result stores.
//!
//! Layout: `<kind>|<field>=<value>|<field>=<value>...`, fields in the order
//! the filter writes them. Value tokens:
//!
//! - absent optional value: `~`
//! - string: the text with `\`, `|`, `=`, `[`, `]`, `,`, `(`, `)` and `~`
//!   escaped by a leading `\`
//! - list: `[a,b,c]` in the given order
//! - set: `[a,b,c]` sorted ascending, duplicates removed
//! - variant: `name(arg,arg)`
//!
//! Numbers, list elements and variant arguments are escaped like strings.
//! Without that `["a,b"]` and `["a","b"]` would share a key.

use std::fmt::{self, Display};

const RESERVED: &[char] = &['\\', '|', '=', '[', ']', ',', '(', ')', '~'];
const ABSENT: &str = "~";
const UNFILTERED: &str = "unfiltered";

// == Filter Key ==
/// Canonical partition key for a paged result series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterKey(String);

impl FilterKey {
    /// Encodes `filter` into its canonical key.
    pub fn encode<F: CacheFilter + ?Sized>(filter: &F) -> Self {
        let mut encoder = KeyEncoder::new(filter.kind());
        filter.encode_fields(&mut encoder);
        encoder.finish()
    }

    /// Constant key for stores whose results are not narrowed by any filter.
    pub fn unfiltered() -> Self {
        FilterKey(UNFILTERED.to_string())
    }

    /// Wraps a key previously produced by [`FilterKey::encode`] or read back
    /// from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        FilterKey(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FilterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Cache Filter ==
/// A domain filter that can be turned into a [`FilterKey`].
///
/// Implementations must write every field, present or not, in a fixed order.
/// Reordering or dropping a field changes every key the filter produces.
pub trait CacheFilter {
    /// Tag distinguishing this filter type from others sharing a store.
    fn kind(&self) -> &'static str;

    fn encode_fields(&self, encoder: &mut KeyEncoder);

    fn filter_key(&self) -> FilterKey {
        FilterKey::encode(self)
    }
}

// == Key Encoder ==
/// Field writer producing the canonical key text.
#[derive(Debug)]
pub struct KeyEncoder {
    out: String,
}

impl KeyEncoder {
    fn new(kind: &str) -> Self {
        let mut out = String::new();
        push_escaped(&mut out, kind);
        Self { out }
    }

    fn field(&mut self, name: &str) -> &mut String {
        self.out.push('|');
        self.out.push_str(name);
        self.out.push('=');
        &mut self.out
    }

    /// Writes a required string field.
    pub fn str(&mut self, name: &str, value: &str) -> &mut Self {
        push_escaped(self.field(name), value);
        self
    }

    /// Writes an optional string field.
    pub fn opt_str(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let out = self.field(name);
        match value {
            Some(value) => push_escaped(out, value),
            None => out.push_str(ABSENT),
        }
        self
    }

    /// Writes a required numeric or boolean field.
    pub fn value<T: Display>(&mut self, name: &str, value: T) -> &mut Self {
        push_display(self.field(name), &value);
        self
    }

    /// Writes an optional numeric or boolean field.
    pub fn opt_value<T: Display>(&mut self, name: &str, value: Option<T>) -> &mut Self {
        let out = self.field(name);
        match value {
            Some(value) => push_display(out, &value),
            None => out.push_str(ABSENT),
        }
        self
    }

    /// Writes an optional ordered list.
    pub fn opt_list<T: Display>(&mut self, name: &str, values: Option<&[T]>) -> &mut Self {
        let out = self.field(name);
        match values {
            Some(values) => push_list(out, values.iter()),
            None => out.push_str(ABSENT),
        }
        self
    }

    /// Writes an optional list whose order and duplicates carry no meaning.
    pub fn opt_set<T: Display + Ord>(&mut self, name: &str, values: Option<&[T]>) -> &mut Self {
        let out = self.field(name);
        match values {
            Some(values) => {
                let mut sorted: Vec<&T> = values.iter().collect();
                sorted.sort();
                sorted.dedup();
                push_list(out, sorted.into_iter());
            }
            None => out.push_str(ABSENT),
        }
        self
    }

    /// Writes an optional variant value such as `between(1990,1999)`.
    pub fn opt_variant<T: Display>(
        &mut self,
        name: &str,
        value: Option<(&str, &[T])>,
    ) -> &mut Self {
        let out = self.field(name);
        match value {
            Some((variant, args)) => {
                push_escaped(out, variant);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    push_display(out, arg);
                }
                out.push(')');
            }
            None => out.push_str(ABSENT),
        }
        self
    }

    fn finish(self) -> FilterKey {
        FilterKey(self.out)
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

fn push_display<T: Display + ?Sized>(out: &mut String, value: &T) {
    push_escaped(out, &value.to_string());
}

fn push_list<'a, T: Display + 'a>(out: &mut String, values: impl Iterator<Item = &'a T>) {
    out.push('[');
    for (i, value) in values.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_display(out, value);
    }
    out.push(']');
}
