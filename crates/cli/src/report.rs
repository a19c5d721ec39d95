//! Plain-text read-outs of selector results.

use std::io::{self, Write};

use profscope_core::CallTree;
use profscope_core::stats::{GcStats, MinorGcMarker, PauseInfo};
use profscope_protocol::Milliseconds;
use profscope_protocol::format::{
    format_bytes, format_milliseconds, format_number, format_percent, format_seconds,
    format_value_total,
};

fn ms(value: Milliseconds) -> String {
    format_milliseconds(value, 3, 2)
}

/// Print the tree depth-first, one node per line, indented by depth.
pub fn write_call_tree(
    out: &mut impl Write,
    tree: &CallTree,
    max_depth: Option<u32>,
) -> io::Result<()> {
    let root_total = tree.root_total();
    writeln!(out, "{:>12} {:>7} {:>12}  Function", "Running", "%", "Self")?;
    for index in tree.iter_depth_first() {
        let Some(node) = tree.node(index) else {
            continue;
        };
        if max_depth.is_some_and(|max| node.depth > max) {
            continue;
        }
        let share = if root_total > 0.0 {
            format_percent(node.total_time / root_total)
        } else {
            String::new()
        };
        writeln!(
            out,
            "{:>12} {:>7} {:>12}  {:indent$}{}",
            ms(tree.to_milliseconds(node.total_time)),
            share,
            ms(tree.to_milliseconds(node.self_time)),
            "",
            node.name,
            indent = node.depth as usize * 2,
        )?;
    }
    Ok(())
}

fn write_pause_info(
    out: &mut impl Write,
    name: &str,
    info: &PauseInfo,
    total_time: Milliseconds,
) -> io::Result<()> {
    if !info.has_pauses() {
        return writeln!(out, "No pauses for {name}.");
    }
    writeln!(out, "{} pauses for {name}:", info.number_of_pauses)?;
    writeln!(
        out,
        "  Mean:            {} ±{}",
        ms(info.mean_pause),
        format_number(info.std_dev, 3, 2)
    )?;
    writeln!(out, "  Median:          {}", ms(info.median_pause))?;
    writeln!(out, "  90th percentile: {}", ms(info.p90_pause))?;
    writeln!(out, "  Max:             {}", ms(info.max_pause))?;
    writeln!(
        out,
        "  Total:           {}",
        format_value_total(info.total_paused, total_time, ms)
    )
}

fn write_nursery_table(
    out: &mut impl Write,
    markers: &[MinorGcMarker],
    zero_at: Milliseconds,
) -> io::Result<()> {
    if markers.is_empty() {
        return Ok(());
    }
    writeln!(out, "Nursery memory information:")?;
    writeln!(
        out,
        "{:>10} {:>10} {:>10} {:>10} {:>10}",
        "Time", "Tenured", "Used", "Lazy", "Capacity"
    )?;
    let bytes = |b: Option<u64>| b.map(format_bytes).unwrap_or_default();
    for marker in markers {
        let time = format_seconds(marker.start - zero_at);
        let nursery = &marker.nursery;
        if nursery.is_complete() {
            writeln!(
                out,
                "{:>10} {:>10} {:>10} {:>10} {:>10}",
                time,
                bytes(nursery.bytes_tenured),
                bytes(nursery.bytes_used),
                bytes(nursery.lazy_capacity),
                bytes(nursery.cur_capacity),
            )?;
        } else {
            writeln!(out, "{time:>10}")?;
        }
    }
    Ok(())
}

/// GC summary: three pause blocks, the major count and the nursery table.
/// Totals are shown as a share of `total_time`; nursery times are relative
/// to `zero_at`.
pub fn write_gc_stats(
    out: &mut impl Write,
    stats: &GcStats,
    total_time: Milliseconds,
    zero_at: Milliseconds,
) -> io::Result<()> {
    write_pause_info(out, "Nursery collections", &stats.minor_pauses, total_time)?;
    write_pause_info(out, "Major slices", &stats.slice_pauses, total_time)?;
    write_pause_info(out, "All pauses", &stats.all_pauses, total_time)?;
    writeln!(out, "Number of majors: {}", stats.num_major)?;
    write_nursery_table(out, &stats.minor_markers, zero_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use profscope_core::model::ThreadBuilder;
    use profscope_protocol::{NurseryInfo, NurseryStatus};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).expect("write to Vec");
        String::from_utf8(buf).expect("utf-8 output")
    }

    #[test]
    fn call_tree_is_indented_and_depth_limited() {
        let mut b = ThreadBuilder::new("Main");
        b.sample(&["main", "run", "parse"], 0.0);
        b.sample(&["main", "run"], 1.0);
        let tree = CallTree::from_thread(&b.build(), 1.0);

        let full = render(|out| write_call_tree(out, &tree, None));
        let lines: Vec<&str> = full.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with("  main"));
        assert!(lines[2].ends_with("    run"));
        assert!(lines[3].ends_with("      parse"));
        assert!(lines[1].contains("100%"));

        let shallow = render(|out| write_call_tree(out, &tree, Some(1)));
        assert_eq!(shallow.lines().count(), 3);
    }

    #[test]
    fn gc_stats_read_out() {
        let stats = GcStats {
            minor_pauses: PauseInfo::from_durations(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            minor_markers: vec![
                MinorGcMarker {
                    start: 1500.0,
                    end: Some(1501.0),
                    nursery: NurseryInfo {
                        status: NurseryStatus::Complete,
                        reason: None,
                        bytes_tenured: Some(512),
                        bytes_used: Some(20_480),
                        cur_capacity: Some(16 << 20),
                        lazy_capacity: None,
                    },
                },
                MinorGcMarker {
                    start: 2000.0,
                    end: Some(2000.5),
                    nursery: NurseryInfo {
                        status: NurseryStatus::NurseryEmpty,
                        reason: None,
                        bytes_tenured: None,
                        bytes_used: None,
                        cur_capacity: None,
                        lazy_capacity: None,
                    },
                },
            ],
            ..GcStats::default()
        };
        let text = render(|out| write_gc_stats(out, &stats, 150.0, 0.0));

        assert!(text.contains("5 pauses for Nursery collections:"));
        assert!(text.contains("Median:          3.00ms"));
        assert!(text.contains("Total:           15.0ms (10%)"));
        assert!(text.contains("No pauses for Major slices."));
        assert!(text.contains("Number of majors: 0"));
        assert!(text.contains("512B"));
        assert!(text.contains("20KB"));
        assert!(text.contains("16MB"));
        assert!(text.contains("1.5s"));
        assert!(text.lines().last().is_some_and(|l| l.trim() == "2.0s"));
    }
}
