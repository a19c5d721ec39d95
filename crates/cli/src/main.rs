mod args;
mod report;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use profscope_core::model::{FuncIndex, Thread};
use profscope_core::parsers::parse_auto;
use profscope_core::range::time_range_for_thread;
use profscope_core::{ProfileState, Selectors, Transform};
use profscope_protocol::PreviewSelection;

use args::Args;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read(&args.profile)
        .with_context(|| format!("failed to read {}", args.profile.display()))?;
    let profile = parse_auto(&data)
        .with_context(|| format!("failed to load {}", args.profile.display()))?;

    let mut state = ProfileState::new(profile);
    state.select_thread(args.thread)?;
    if args.start.is_some() || args.end.is_some() {
        state.set_preview_selection(PreviewSelection {
            start: args.start,
            end: args.end,
            is_modifying: false,
        });
    }

    let thread = std::sync::Arc::clone(&state.profile().threads[args.thread]);
    let transforms = transforms_from_args(&args, &thread)?;
    state.update_filter_settings(args.thread, |settings| {
        settings.search.clone_from(&args.search);
        settings.implementation = args.implementation;
        settings.invert = args.invert;
        settings.transforms = transforms;
    })?;
    info!("thread {} ({}), {} samples", args.thread, thread.name, thread.sample_count());

    let selectors = Selectors::new();
    let view = selectors.selected(&state)?;
    let mut out = io::stdout().lock();

    if args.gc {
        let preview = view.preview_filtered_thread();
        let total_time = time_range_for_thread(&preview, state.profile().interval()).length();
        report::write_gc_stats(
            &mut out,
            &view.preview_filtered_gc_stats(),
            total_time,
            state.root_range().start,
        )?;
    } else {
        report::write_call_tree(&mut out, &view.call_tree(), args.max_depth)?;
    }
    out.flush()?;
    Ok(())
}

/// Focus first, then drops, then merges.
fn transforms_from_args(args: &Args, thread: &Thread) -> Result<Vec<Transform>> {
    let mut transforms = Vec::new();
    if let Some(name) = &args.focus {
        transforms.push(Transform::FocusFunction {
            func: func_by_name(thread, name)?,
        });
    }
    for name in &args.drop {
        transforms.push(Transform::DropFunction {
            func: func_by_name(thread, name)?,
        });
    }
    for name in &args.merge {
        transforms.push(Transform::MergeFunction {
            func: func_by_name(thread, name)?,
        });
    }
    Ok(transforms)
}

fn func_by_name(thread: &Thread, name: &str) -> Result<FuncIndex> {
    (0..thread.func_table.len())
        .find(|&func| thread.func_name(func).as_str() == name)
        .with_context(|| format!("no function named '{name}' in thread '{}'", thread.name))
}
