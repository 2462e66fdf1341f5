//! Tag command handlers

use anyhow::Result;

use storyvault_core::{Library, StoryFilter};

use crate::output::Output;

/// List tag facets with story counts, "all" first
pub fn list(library: &Library, output: &Output) -> Result<()> {
    let tags: Vec<(String, usize)> = library
        .tags()
        .into_iter()
        .map(|tag| {
            let count = library.filter(&StoryFilter::tag(tag.as_str())).len();
            (tag, count)
        })
        .collect();

    output.print_tags(&tags);
    Ok(())
}
