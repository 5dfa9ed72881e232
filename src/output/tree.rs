//! Indented tree rendering of a site map
//!
//! The site map is a possibly cyclic graph, so it is walked with an explicit
//! stack. A page that was already printed is shown once more with a
//! `(see above)` marker instead of being expanded again.

use crate::crawler::SiteMap;
use std::collections::HashSet;
use std::io::{self, Write};
use url::Url;

/// Marker appended to a page that was already expanded elsewhere in the tree
pub const SEE_ABOVE: &str = "(see above)";

const INDENT: &str = "  ";
const BRANCH: &str = "|-";

/// Writes the site map as an indented tree starting at its root
///
/// Children are listed in the order the links appeared on their page.
pub fn write_tree<W: Write>(site_map: &SiteMap, out: &mut W) -> io::Result<()> {
    let mut printed: HashSet<&Url> = HashSet::new();
    let mut stack: Vec<(&Url, usize)> = vec![(site_map.root(), 0)];

    while let Some((address, level)) = stack.pop() {
        for _ in 0..level {
            out.write_all(INDENT.as_bytes())?;
        }
        if level > 0 {
            out.write_all(BRANCH.as_bytes())?;
        }

        if !printed.insert(address) {
            writeln!(out, "{} {}", address, SEE_ABOVE)?;
            continue;
        }

        writeln!(out, "{}", address)?;

        let children = site_map.links(address).unwrap_or(&[]);
        // Reversed so the first link is popped first
        stack.extend(children.iter().rev().map(|child| (child, level + 1)));
    }

    Ok(())
}

/// Renders the site map tree into a string
pub fn render_tree(site_map: &SiteMap) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_tree(site_map, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Prints the site map tree to stdout
pub fn print_tree(site_map: &SiteMap) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_tree(site_map, &mut handle)?;
    handle.flush()
}
