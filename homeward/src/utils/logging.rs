use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use std::cell::RefCell;

// Categories of timed operations
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum OperationCategory {
    Directions {
        subcategory: DirectionsOpType,
    },
    Reconcile {
        subcategory: ReconcileType,
    },
    Storage {
        subcategory: StorageType,
    },
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum DirectionsOpType {
    Request,
    Parse,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum ReconcileType {
    Event,
    Rebuild,
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum StorageType {
    Load,
    Save,
    Clear,
}

impl OperationCategory {
    pub fn as_str(&self) -> String {
        match self {
            OperationCategory::Directions { subcategory } => {
                format!("Directions - {}", match subcategory {
                    DirectionsOpType::Request => "Request",
                    DirectionsOpType::Parse => "Parse",
                })
            },
            OperationCategory::Reconcile { subcategory } => {
                format!("Reconcile - {}", match subcategory {
                    ReconcileType::Event => "Event",
                    ReconcileType::Rebuild => "Rebuild",
                })
            },
            OperationCategory::Storage { subcategory } => {
                format!("Storage - {}", match subcategory {
                    StorageType::Load => "Load",
                    StorageType::Save => "Save",
                    StorageType::Clear => "Clear",
                })
            },
        }
    }
}

thread_local! {
    static TIMING_STACK: RefCell<Vec<(String, OperationCategory, Instant)>> = RefCell::new(Vec::new());
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref CATEGORY_TIMINGS: Arc<RwLock<HashMap<OperationCategory, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref HIERARCHICAL_TIMINGS: Arc<RwLock<HashMap<String, (Duration, usize, Vec<String>)>>> = Arc::new(RwLock::new(HashMap::new()));
}

// 1ns to 60s at three significant figures
fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(1, 60_000_000_000, 3).ok()
}

/// Records the elapsed time of a synchronous section when dropped. Do not
/// hold one across an `.await`; the nesting stack is per thread.
pub struct TimingGuard {
    function_name: String,
    category: OperationCategory,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        record_timing_end(&self.function_name, duration, &self.category);
    }
}

pub fn start_timing(function_name: &str, category: OperationCategory) -> TimingGuard {
    let guard = TimingGuard {
        function_name: function_name.to_string(),
        category: category.clone(),
        start: Instant::now(),
    };

    if is_timing_enabled() {
        TIMING_STACK.with(|stack| {
            stack.borrow_mut().push((function_name.to_string(), category, Instant::now()));
        });
    }

    guard
}

/// Records a duration measured elsewhere, e.g. across an await point.
pub fn record_duration(function_name: &str, duration: Duration, category: &OperationCategory) {
    if !is_timing_enabled() {
        return;
    }
    record_histograms(function_name, duration, category);
}

fn record_timing_end(function_name: &str, duration: Duration, category: &OperationCategory) {
    if !is_timing_enabled() {
        return;
    }

    // Pop from timing stack and note the caller
    TIMING_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.pop().is_some() {
            let mut hierarchical = HIERARCHICAL_TIMINGS.write();
            let entry = hierarchical
                .entry(function_name.to_string())
                .or_insert((Duration::from_nanos(0), 0, Vec::new()));

            entry.0 += duration;
            entry.1 += 1;

            if let Some((parent_name, _, _)) = stack.last() {
                if !entry.2.contains(parent_name) {
                    entry.2.push(parent_name.clone());
                }
            }
        }
    });

    record_histograms(function_name, duration, category);
}

fn record_histograms(function_name: &str, duration: Duration, category: &OperationCategory) {
    let duration_ns = (duration.as_nanos() as u64).max(1);

    {
        let mut timings = FUNCTION_TIMINGS.write();
        if !timings.contains_key(function_name) {
            if let Some(histogram) = new_histogram() {
                timings.insert(function_name.to_string(), histogram);
            }
        }
        if let Some(histogram) = timings.get_mut(function_name) {
            let _ = histogram.record(duration_ns);
        }
    }

    {
        let mut category_timings = CATEGORY_TIMINGS.write();
        if !category_timings.contains_key(category) {
            if let Some(histogram) = new_histogram() {
                category_timings.insert(category.clone(), histogram);
            }
        }
        if let Some(histogram) = category_timings.get_mut(category) {
            let _ = histogram.record(duration_ns);
        }
    }
}

pub fn init_logging(enable_timing: bool, debug_logging: bool) -> Result<(), SetGlobalDefaultError> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let crate_level = if debug_logging { "homeward=debug" } else { "homeward=info" };
    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if let Ok(directive) = crate_level.parse::<tracing_subscriber::filter::Directive>() {
        env_filter = env_filter.add_directive(directive);
    }

    // Every span histogram is shaped like the template
    if let Some(template) = new_histogram().filter(|_| enable_timing) {
        let timing_layer = Builder::default().layer(move || Histogram::new_from(&template));

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty());

        tracing::subscriber::set_global_default(subscriber)
    }
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nPerformance Report");
    println!("==================");

    println!("\nHierarchical Timing Analysis:");
    println!("---------------------------");
    let hierarchical = HIERARCHICAL_TIMINGS.read();
    let mut entries: Vec<_> = hierarchical.iter().collect();
    entries.sort_by(|a, b| b.1.0.cmp(&a.1.0));

    for (function_name, (total_duration, count, parents)) in entries {
        let avg_duration = total_duration.div_f64(*count as f64);
        println!(
            "{}: total={:.3}s, count={}, avg={:.3}ms{}",
            function_name,
            total_duration.as_secs_f64(),
            count,
            avg_duration.as_secs_f64() * 1000.0,
            if !parents.is_empty() {
                format!("\n  Called by: {}", parents.join(", "))
            } else {
                String::new()
            }
        );
    }

    println!("\nPerformance by Category:");
    println!("------------------------");
    let category_timings = CATEGORY_TIMINGS.read();
    let mut category_vec: Vec<_> = category_timings.iter().collect();
    category_vec.sort_by(|a, b| {
        b.1.mean().partial_cmp(&a.1.mean()).unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_time: f64 = category_vec.iter()
        .map(|(_, hist)| hist.mean() * (hist.len() as f64))
        .sum();

    for (category, histogram) in category_vec {
        let category_total = histogram.mean() * (histogram.len() as f64);
        let percentage = if total_time > 0.0 { (category_total / total_time) * 100.0 } else { 0.0 };
        println!(
            "{}: {:.1}% of total time\n  mean={:.3}ms, p95={:.3}ms, p99={:.3}ms, count={}",
            category.as_str(),
            percentage,
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.value_at_quantile(0.99) as f64 / 1_000_000.0,
            histogram.len(),
        );
    }

    println!("==================\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels() {
        let category = OperationCategory::Directions { subcategory: DirectionsOpType::Parse };
        assert_eq!(category.as_str(), "Directions - Parse");
        assert_eq!(
            OperationCategory::Storage { subcategory: StorageType::Clear }.as_str(),
            "Storage - Clear"
        );
    }

    #[test]
    fn guards_are_inert_while_timing_disabled() {
        {
            let _timing = start_timing("noop",
                OperationCategory::Reconcile { subcategory: ReconcileType::Rebuild });
        }
        TIMING_STACK.with(|stack| assert!(stack.borrow().is_empty()));
        assert!(!FUNCTION_TIMINGS.read().contains_key("noop"));
    }

    #[test]
    fn span_histograms_cover_one_minute() {
        let template = new_histogram().unwrap();
        let mut histogram: Histogram<u64> = Histogram::new_from(&template);
        assert!(histogram.record(59_000_000_000).is_ok());
        assert_eq!(histogram.high(), template.high());
    }
}
