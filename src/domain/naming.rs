//! Project and module name canonicalization
//!
//! Rye derives the package directory under `src/` from the project name:
//! `My.Project_Name` → project `my-project-name` → module `my_project_name`.

/// Canonical (slug) form of a project name.
///
/// Transliterates the name to ASCII (`Über` → `Uber`), lower-cases it,
/// replaces every run of non-alphanumeric characters with a single `-` and
/// trims leading and trailing separators.
pub fn canonicalize_name(project_name: &str) -> String {
    let ascii = deunicode::deunicode(project_name);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;

    for c in ascii.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Python module name for a project name (`my-project` → `my_project`)
pub fn module_name(project_name: &str) -> String {
    canonicalize_name(project_name).replace('-', "_")
}
