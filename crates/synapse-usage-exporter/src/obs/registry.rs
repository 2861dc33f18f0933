//! Usage metric registry.
//!
//! One gauge series per measurement name, all sharing the same ordered label
//! schema. Each series maps a label tuple to a value slot.
//!
//! Concurrency:
//! - Slot creation goes through the `DashMap` entry API, which holds the
//!   shard lock exclusively, so a fresh tuple gets exactly one slot even when
//!   several reports race for it.
//! - Values are `f64` bits in an `AtomicU64`; a set is a single store.
//! - Scrapes read one series at a time (short shard read locks); there is no
//!   snapshot isolation across series.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use synapse_usage_core::error::{Result, UsageError};
use synapse_usage_core::protocol::fields::is_valid_metric_name;
use synapse_usage_core::protocol::{LabelSchema, LabelValues};

use super::exposition::is_reserved;

/// Limits and naming applied to every series.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Prepended to measurement names on exposition.
    pub prefix: String,
    /// Max label tuples per series.
    pub max_label_sets: usize,
    /// Max series, counting the predeclared ones.
    pub max_series: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            prefix: synapse_usage_core::protocol::DEFAULT_METRICS_PREFIX.to_string(),
            max_label_sets: 1024,
            max_series: 256,
        }
    }
}

/// Static build metadata, exposed as `app_build_info_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub build: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: "undefined".into(),
            build: "undefined".into(),
        }
    }
}

impl BuildInfo {
    pub fn pairs(&self) -> [(&str, &str); 2] {
        [("version", self.version.as_str()), ("build", self.build.as_str())]
    }
}

#[derive(Debug, Default)]
struct GaugeSlot {
    bits: AtomicU64,
}

impl GaugeSlot {
    fn set(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// One measurement's gauge series.
#[derive(Debug)]
pub struct Series {
    name: String,
    exposed: String,
    slots: DashMap<LabelValues, GaugeSlot>,
}

impl Series {
    fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            exposed: format!("{prefix}{name}"),
            slots: DashMap::new(),
        }
    }

    /// Measurement name as reported by the client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefixed name used on exposition.
    pub fn exposed_name(&self) -> &str {
        &self.exposed
    }

    /// Help text (the bare measurement name).
    pub fn help(&self) -> &str {
        &self.name
    }

    /// Current slots, sorted by label tuple.
    pub fn slots(&self) -> Vec<(LabelValues, f64)> {
        let mut out: Vec<(LabelValues, f64)> = self
            .slots
            .iter()
            .map(|r| (r.key().clone(), r.value().get()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn ensure(&self, labels: &LabelValues, limit: usize) -> Result<bool> {
        if self.slots.contains_key(labels) {
            return Ok(false);
        }
        // Approximate under contention; the entry below is what guarantees one slot per tuple.
        if self.slots.len() >= limit {
            // a concurrent caller may have just created this tuple
            if self.slots.contains_key(labels) {
                return Ok(false);
            }
            return Err(UsageError::CardinalityExceeded {
                measurement: self.name.clone(),
                limit,
            });
        }
        match self.slots.entry(labels.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(v) => {
                v.insert(GaugeSlot::default());
                Ok(true)
            }
        }
    }

    fn set(&self, labels: &LabelValues, v: f64) -> Result<()> {
        match self.slots.get(labels) {
            Some(slot) => {
                slot.set(v);
                Ok(())
            }
            None => Err(UsageError::SlotMissing {
                measurement: self.name.clone(),
                labels: labels.as_slice().to_vec(),
            }),
        }
    }
}

/// Registry of all usage series.
pub struct MetricRegistry {
    opts: RegistryOptions,
    schema: LabelSchema,
    series: DashMap<String, Arc<Series>>,
    // registration order, for stable exposition
    order: RwLock<Vec<Arc<Series>>>,
    build: BuildInfo,
}

impl MetricRegistry {
    /// Declare the measurement series and their label schema.
    ///
    /// Called once at startup. Fails on invalid or duplicate names, or when a
    /// measurement name is also a label field.
    pub fn define<I, S>(measurements: I, schema: LabelSchema, opts: RegistryOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if opts.max_label_sets == 0 || opts.max_series == 0 {
            return Err(UsageError::Config("registry limits must be non-zero".into()));
        }
        let reg = Self {
            opts,
            schema,
            series: DashMap::new(),
            order: RwLock::new(Vec::new()),
            build: BuildInfo::default(),
        };
        for m in measurements {
            let m = m.as_ref();
            if reg.series.contains_key(m) {
                return Err(UsageError::Config(format!("duplicate measurement: {m}")));
            }
            reg.register(m)
                .map_err(|e| UsageError::Config(format!("cannot define {m}: {e}")))?;
        }
        Ok(reg)
    }

    /// Attach build metadata. Only possible before the registry is shared.
    pub fn with_build_info(mut self, build: BuildInfo) -> Self {
        self.build = build;
        self
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    pub fn build_info(&self) -> &BuildInfo {
        &self.build
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.opts
    }

    pub fn is_defined(&self, measurement: &str) -> bool {
        self.series.contains_key(measurement)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Add a series with the current label schema. Returns `false` if it already exists.
    pub fn register(&self, measurement: &str) -> Result<bool> {
        if self.series.contains_key(measurement) {
            return Ok(false);
        }
        let exposed = format!("{}{measurement}", self.opts.prefix);
        if self.schema.contains(measurement)
            || !is_valid_metric_name(&exposed)
            || is_reserved(&exposed)
        {
            return Err(UsageError::UnknownMeasurement(measurement.to_string()));
        }
        if self.series.len() >= self.opts.max_series {
            return Err(UsageError::CardinalityExceeded {
                measurement: measurement.to_string(),
                limit: self.opts.max_series,
            });
        }
        match self.series.entry(measurement.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(v) => {
                let series = Arc::new(Series::new(measurement, &self.opts.prefix));
                self.order
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Arc::clone(&series));
                v.insert(series);
                Ok(true)
            }
        }
    }

    /// Create the slot for `labels` if missing. Returns `true` if it was created.
    pub fn ensure_slot(&self, measurement: &str, labels: &LabelValues) -> Result<bool> {
        self.schema.check(labels)?;
        self.get_series(measurement)?
            .ensure(labels, self.opts.max_label_sets)
    }

    /// Overwrite the slot for `labels`. The slot must already exist.
    pub fn set_value(&self, measurement: &str, labels: &LabelValues, value: f64) -> Result<()> {
        self.schema.check(labels)?;
        self.get_series(measurement)?.set(labels, value)
    }

    /// Current value of one slot.
    pub fn value(&self, measurement: &str, labels: &LabelValues) -> Option<f64> {
        let series = self.series.get(measurement)?;
        let slot = series.slots.get(labels)?;
        Some(slot.get())
    }

    /// A re-enumerable view over every series for exposition.
    pub fn snapshot(&self) -> Snapshot {
        let series = self
            .order
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Snapshot { series }
    }

    fn get_series(&self, measurement: &str) -> Result<Arc<Series>> {
        self.series
            .get(measurement)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| UsageError::UnknownMeasurement(measurement.to_string()))
    }
}

/// One exposed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub measurement: &'a str,
    pub labels: LabelValues,
    pub value: f64,
}

/// Series handles captured at snapshot time. Values are read lazily, so each
/// call to [`Snapshot::iter`] sees the slots as they are at that moment.
pub struct Snapshot {
    series: Vec<Arc<Series>>,
}

impl Snapshot {
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.series.iter().map(|s| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> + '_ {
        self.series.iter().flat_map(|s| {
            s.slots().into_iter().map(move |(labels, value)| Sample {
                measurement: s.name(),
                labels,
                value,
            })
        })
    }
}
