//! Rendering of a Profiler's running statistics.
//!
//! Relative standard deviations, ratios and means derived from them may not
//! be finite. The text renderer prints `n/a` for a non-finite spread; the
//! JSON renderer emits `null` for any non-finite number.

use accumulator::RunningStat;
use profiler::Profiler;
use serde_json;

/// Render a human readable report, one block per instrument.
///
/// ```text
/// PMU Counter:
///   CPU cycles: 1203344 cycles ±1.25% (n=10)
///   Cache miss ratio: 0.0412 ±n/a (n=10)
/// ```
pub fn render_text(profiler: &Profiler) -> String {
    let mut out = String::new();
    for (id, acc) in profiler.accumulators() {
        out.push_str(&format!("{}:\n", id));
        for (name, stat) in acc.iter() {
            out.push_str(&fmt_line(name, stat));
        }
    }
    out
}

fn fmt_line(name: &str, stat: &RunningStat) -> String {
    let unit = if stat.unit().is_empty() {
        String::new()
    } else {
        format!(" {}", stat.unit())
    };
    let rsd = stat.relative_standard_deviation();
    let spread = if rsd.is_finite() {
        format!("±{:.2}%", rsd)
    } else {
        "±n/a".to_string()
    };
    format!(
        "  {}: {}{} {} (n={})\n",
        name,
        stat.mean(),
        unit,
        spread,
        stat.count()
    )
}

/// Render the report as a JSON object keyed by instrument id, then metric
/// name.
pub fn render_json(profiler: &Profiler) -> serde_json::Value {
    let mut doc = serde_json::Map::new();
    for (id, acc) in profiler.accumulators() {
        let mut metrics = serde_json::Map::new();
        for (name, stat) in acc.iter() {
            metrics.insert(
                name.to_string(),
                json!({
                    "mean": stat.mean(),
                    "min": stat.min(),
                    "max": stat.max(),
                    "unit": stat.unit(),
                    "count": stat.count(),
                    "rsd": stat.relative_standard_deviation(),
                    "raw_data": stat.raw_data(),
                }),
            );
        }
        doc.insert(id.to_string(), serde_json::Value::Object(metrics));
    }
    serde_json::Value::Object(doc)
}
