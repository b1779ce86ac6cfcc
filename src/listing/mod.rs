use std::fmt::Display;
use std::io::{self, Write};

use crate::collection::{Mod, ModCollection};
use crate::resources::NodeRef;

const PADDING_SCALE: usize = 2;

fn write_title<W: Write>(out: &mut W, item: impl Display, indent_level: usize) -> io::Result<()> {
    writeln!(out, "{} ┖ {}", " ".repeat(indent_level * PADDING_SCALE), item)
}

fn write_item<W: Write>(out: &mut W, item: impl Display, indent_level: usize) -> io::Result<()> {
    writeln!(out, "{} - {}", " ".repeat(indent_level * PADDING_SCALE), item)
}

fn write_section<W: Write>(out: &mut W, title: &str, items: &[NodeRef<'_>]) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    write_title(out, title, 1)?;
    for item in items {
        write_item(out, item, 2)?;
    }
    Ok(())
}

/// Writes the plugins, archives and resource directories of one data directory.
pub fn write_data_dir_contents<W: Write>(out: &mut W, data_dir: NodeRef<'_>) -> io::Result<()> {
    write_section(out, "ESPs", &data_dir.esp_files())?;
    write_section(out, "BSAs", &data_dir.bsa_files())?;
    write_section(out, "Resources", &data_dir.resource_dirs())
}

/// Writes every data directory of a mod. Nested data directories are titled
/// with their folder name.
pub fn write_mod_contents<W: Write>(out: &mut W, m: &Mod) -> io::Result<()> {
    let root = m.root();
    for data_dir in m.data_directories() {
        if data_dir != root {
            write_title(out, data_dir, 0)?;
        }
        write_data_dir_contents(out, data_dir)?;
    }
    Ok(())
}

/// Writes the parsed title, variant, version and modification time of a mod.
/// Mods whose name could not be parsed are titled by folder name instead.
pub fn write_mod_metadata<W: Write>(out: &mut W, m: &Mod) -> io::Result<()> {
    let meta = match m.metadata() {
        Ok(meta) => meta,
        Err(err) => {
            write_title(out, m.name(), 0)?;
            return write_item(out, format!("unparsed: {err}"), 1);
        }
    };

    write_title(out, &meta.title, 0)?;
    if let Some(variant) = &meta.variant {
        write_item(out, format!("variant: {variant}"), 1)?;
    }
    write_item(out, format!("version: {}", meta.version), 1)?;
    write_item(out, format!("modified: {}", meta.modified_time.format("%Y-%m-%d %H:%M:%S")), 1)?;
    if let Some(posted) = meta.posted_time {
        write_item(out, format!("posted: {}", posted.format("%Y-%m-%d %H:%M:%S")), 1)?;
    }
    Ok(())
}

/// Writes metadata and contents of every mod, then the folders that were skipped.
pub fn write_collection<W: Write>(out: &mut W, collection: &ModCollection) -> io::Result<()> {
    for m in collection.mods() {
        write_mod_metadata(out, m)?;
        write_mod_contents(out, m)?;
    }
    if !collection.failures().is_empty() {
        write_title(out, "Skipped", 0)?;
        for failure in collection.failures() {
            write_item(out, format!("{}: {}", failure.path.display(), failure.error), 1)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ParsingSettings;
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn render(root: &Path) -> String {
        let collection = ModCollection::build(root, &ParsingSettings::default()).unwrap();
        let mut out = Vec::new();
        write_collection(&mut out, &collection).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_top_level_data_directory() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Tamriel_Data_v8 - HD/Tamriel_Data.esp"));
        touch(&dir.path().join("Tamriel_Data_v8 - HD/PT_Data.bsa"));
        touch(&dir.path().join("Tamriel_Data_v8 - HD/Meshes/tr.nif"));

        let text = render(dir.path());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], " ┖ Tamriel Data");
        assert_eq!(lines[1], "   - variant: HD");
        assert_eq!(lines[2], "   - version: v8");
        assert!(lines[3].starts_with("   - modified: "));
        assert_eq!(
            &lines[4..],
            &[
                "   ┖ ESPs",
                "     - Tamriel_Data",
                "   ┖ BSAs",
                "     - PT_Data",
                "   ┖ Resources",
                "     - Meshes",
            ]
        );
    }

    #[test]
    fn renders_nested_data_directories_with_titles() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Sounds 1.0/Option A/a.esp"));

        let text = render(dir.path());
        assert!(text.contains(" ┖ Option A\n   ┖ ESPs\n     - a\n"));
    }

    #[cfg(unix)]
    #[test]
    fn renders_skipped_mods_last() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        touch(&dir.path().join("Good 1.0/good.esp"));
        let locked = dir.path().join("Locked 1.0/inner");
        fs::create_dir_all(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let readable = fs::read_dir(&locked).is_ok();

        let text = render(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            // permissions are not enforced for this user
            return;
        }

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], " ┖ Good");
        let skipped = lines.iter().position(|l| *l == " ┖ Skipped").unwrap();
        assert_eq!(skipped, lines.len() - 2);
        let expected = format!("   - {}: ", dir.path().join("Locked 1.0").display());
        assert!(lines[skipped + 1].starts_with(&expected));
    }

    #[test]
    fn renders_unparsed_names_by_folder() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("Untitled/a.esp"));

        let text = render(dir.path());
        assert!(text.starts_with(" ┖ Untitled\n   - unparsed: "));
    }
}
