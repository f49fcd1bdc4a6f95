// Renders roff man pages for `spark` and each visible subcommand into
// `$OUT_DIR/man` (`spark.1`, `spark-fn.1`, ...) for packaging.

use std::path::Path;

use clap::CommandFactory;

// Only clap types live in cli.rs, so it builds against the build-dependencies.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        panic!("OUT_DIR is unset; run this through cargo");
    };
    let man_dir = Path::new(&out_dir).join("man");
    std::fs::create_dir_all(&man_dir)
        .unwrap_or_else(|e| panic!("cannot create {}: {e}", man_dir.display()));

    let spark = cli::Cli::command();
    let bin = spark.get_name().to_owned();
    write_page(&man_dir, &bin, spark.clone());

    for sub in spark.get_subcommands().filter(|s| !s.is_hide_set()) {
        let page = format!("{bin}-{}", sub.get_name());
        write_page(&man_dir, &page, sub.clone().name(page.clone()));
    }
}

fn write_page(dir: &Path, page: &str, cmd: clap::Command) {
    let mut roff = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut roff)
        .unwrap_or_else(|e| panic!("cannot render {page}.1: {e}"));

    let path = dir.join(format!("{page}.1"));
    std::fs::write(&path, roff).unwrap_or_else(|e| panic!("cannot write {}: {e}", path.display()));
}
