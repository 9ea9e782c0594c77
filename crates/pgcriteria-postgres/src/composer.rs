//! Fragment builder: the text and parameter accumulator shared by a
//! sequence of compiled criteria.

use std::fmt::Write;

use sqlx::postgres::PgArguments;

use crate::types::BoundValue;
use crate::Result;

/// Configuration of a fragment builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Prefix of table aliases; column id 3 renders as `t3.`
    pub alias_prefix: String,
    /// Number of parameters already bound elsewhere; the first placeholder
    /// written is `$(offset + 1)`
    pub placeholder_offset: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            alias_prefix: "t".to_string(),
            placeholder_offset: 0,
        }
    }
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias_prefix(mut self, prefix: &str) -> Self {
        self.alias_prefix = prefix.to_string();
        self
    }

    pub fn with_placeholder_offset(mut self, offset: usize) -> Self {
        self.placeholder_offset = offset;
        self
    }
}

/// Accumulates predicate text and bound parameters.
///
/// A builder belongs to one predicate composition at a time. After any write
/// error the accumulated state must be discarded.
#[derive(Debug)]
pub struct FragmentBuilder<W = String> {
    sink: W,
    params: Vec<BoundValue>,
    /// Placeholders written so far, offset excluded
    placeholders: usize,
    /// Set once any clause has been written
    dirty: bool,
    config: BuilderConfig,
}

impl FragmentBuilder<String> {
    /// Creates a builder writing into a fresh `String`.
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self::with_sink(String::new(), config)
    }

    /// The SQL written so far.
    pub fn sql(&self) -> &str {
        &self.sink
    }

    /// Returns the (SQL, parameters) tuple.
    pub fn build(self) -> (String, Vec<BoundValue>) {
        self.into_parts()
    }
}

impl Default for FragmentBuilder<String> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> FragmentBuilder<W> {
    /// Creates a builder writing into an arbitrary sink.
    pub fn with_sink(sink: W, config: BuilderConfig) -> Self {
        Self {
            sink,
            params: Vec::new(),
            placeholders: 0,
            dirty: false,
            config,
        }
    }

    /// Writes literal text.
    pub fn write_text(&mut self, s: &str) -> Result<()> {
        self.sink.write_str(s)?;
        Ok(())
    }

    /// Writes the table alias qualifying a column, e.g. `t2.`.
    ///
    /// Columns without an id are written unqualified.
    pub fn write_alias(&mut self, column_id: Option<u32>) -> Result<()> {
        if let Some(id) = column_id {
            write!(self.sink, "{}{}.", self.config.alias_prefix, id)?;
        }
        Ok(())
    }

    /// Writes the next positional placeholder (`$1`, `$2`, ...).
    pub fn write_placeholder(&mut self) -> Result<()> {
        self.placeholders += 1;
        write!(self.sink, "${}", self.config.placeholder_offset + self.placeholders)?;
        Ok(())
    }

    /// Appends a bound parameter.
    pub fn add_param(&mut self, value: BoundValue) {
        self.params.push(value);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn params(&self) -> &[BoundValue] {
        &self.params
    }

    /// Number of placeholders written, not counting the configured offset.
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn into_parts(self) -> (W, Vec<BoundValue>) {
        (self.sink, self.params)
    }

    /// Binds every parameter, in placeholder order, into sqlx arguments.
    pub fn to_arguments(&self) -> Result<PgArguments> {
        let mut arguments = PgArguments::default();
        for param in &self.params {
            param.bind_to_arguments(&mut arguments)?;
        }
        Ok(arguments)
    }
}

impl<W: Write + Default> FragmentBuilder<W> {
    /// Clears text, parameters, the placeholder counter and the dirty flag.
    pub fn reset(&mut self) {
        self.sink = W::default();
        self.params.clear();
        self.placeholders = 0;
        self.dirty = false;
    }
}
