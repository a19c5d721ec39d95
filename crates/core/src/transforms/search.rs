use crate::model::{FuncIndex, Thread};

/// Split a comma-separated search string into lowercase terms, dropping
/// blanks.
pub fn search_terms(search: &str) -> Vec<String> {
    search
        .split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Null the stack of every sample that doesn't match all search terms. A
/// sample matches a term when some frame on its stack belongs to a function
/// whose name or file name contains the term, ignoring case.
///
/// Samples are never removed so the sample count, and with it total time,
/// stays the same.
pub fn filter_thread_to_search_string(thread: &Thread, search: &str) -> Thread {
    let terms = search_terms(search);
    if terms.is_empty() {
        return thread.clone();
    }
    terms
        .iter()
        .fold(thread.clone(), |thread, term| filter_thread_to_term(&thread, term))
}

fn filter_thread_to_term(thread: &Thread, term: &str) -> Thread {
    let mut func_matches: Vec<Option<bool>> = vec![None; thread.func_table.len()];
    let mut func_match = |func: FuncIndex| -> bool {
        *func_matches[func].get_or_insert_with(|| {
            let name = thread.func_name(func);
            if name.contains_lowercase(term) {
                return true;
            }
            thread
                .func_table
                .file_name(func)
                .and_then(|s| thread.string_table.get(s))
                .is_some_and(|file| file.contains_lowercase(term))
        })
    };

    let stacks = &thread.stack_table;
    let mut stack_matches = Vec::with_capacity(stacks.len());
    for stack in 0..stacks.len() {
        let inherited = stacks.prefix(stack).is_some_and(|p| stack_matches[p]);
        stack_matches.push(inherited || func_match(thread.stack_func(stack)));
    }

    let samples = thread
        .samples
        .map_stacks(|stack| stack_matches[stack].then_some(stack));
    thread.with_samples(samples)
}
