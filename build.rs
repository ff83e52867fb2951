use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use syntect::dumps::dump_to_uncompressed_file;
use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, css_for_theme_with_class_style};
use two_face::syntax;

const LIGHT_SYNTAX_THEME: &str = "InspiredGitHub";
const DARK_SYNTAX_THEME: &str = "base16-ocean.dark";

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    write_syntax_pack(&out_dir).expect("failed to write syntax pack");
    write_theme_css(&out_dir, LIGHT_SYNTAX_THEME, "syntax-light.css")
        .expect("failed to write light syntax theme");
    write_theme_css(&out_dir, DARK_SYNTAX_THEME, "syntax-dark.css")
        .expect("failed to write dark syntax theme");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=templates");
}

fn write_theme_css(out_dir: &Path, theme_name: &str, file_name: &str) -> Result<(), String> {
    let theme_set = ThemeSet::load_defaults();
    let theme = theme_set
        .themes
        .get(theme_name)
        .ok_or_else(|| format!("theme `{theme_name}` not found"))?;

    let css = css_for_theme_with_class_style(theme, ClassStyle::SpacedPrefixed { prefix: "syntax-" })
        .map_err(|err| err.to_string())?;

    let path = out_dir.join(file_name);
    fs::write(&path, css).map_err(|err| format!("failed to write {}: {err}", path.display()))
}

fn write_syntax_pack(out_dir: &Path) -> Result<(), String> {
    let syntax_set = syntax::extra_newlines();
    let pack_path = out_dir.join("syntaxes.packdump");
    dump_to_uncompressed_file(&syntax_set, &pack_path)
        .map_err(|err| format!("failed to encode syntax set: {err}"))?;

    println!("cargo:rustc-env=SYNTAX_PACK_FILE={}", pack_path.display());

    Ok(())
}
