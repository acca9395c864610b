use super::tables::{SimpleTableBuilder, TableBuilder, add_field, add_simple};
use crate::config::Config;
use crate::elf::ElfFile;
use crate::errors::ConvertError;
use crate::image::{self, BootStub, FlatImage, WritePlan};
use crate::utils::{Styling, uwriteln};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;

/// What got written, mostly for tests.
#[derive(Debug)]
pub struct Summary {
    pub output: PathBuf,
    pub size: usize,
    pub entry: u64,
    pub digest: String,
}

/// Converts the ELF file at input into a flat image at output. Progress is written to
/// out. On failure output is left as it was.
pub fn convert(
    input: &Path,
    output: &Path,
    config: &Config,
    mut out: impl Write,
) -> Result<Summary, ConvertError> {
    uwriteln!(out, "converting {}", input.display());
    let file = ElfFile::new(input)?;
    let stub = BootStub::load(&config.stub_path)?;
    let segments = file.segments()?;
    let got = file.got()?;

    let plan = image::plan(&segments, got.as_ref(), file.entry(), &stub.template)?;
    write_plan(&mut out, &plan, config.explain);
    let image = image::render(&plan, &config.build_options())?;

    write_image(output, &image)?;

    let summary = Summary {
        output: output.to_path_buf(),
        size: image.size(),
        entry: file.entry(),
        digest: image.digest(),
    };
    write_summary(&mut out, &file, &stub, plan.end_addr, &summary);
    if config.dump > 0 {
        uwriteln!(out);
        image.hex_dump(&mut out, 0, config.dump);
    }
    Ok(summary)
}

/// Writes the image to a temporary file next to path and then renames it so that
/// readers never see a partial image.
pub fn write_image(path: &Path, image: &FlatImage) -> Result<(), ConvertError> {
    let failed = |source: io::Error| ConvertError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok();
    if existing.as_ref().is_some_and(|m| m.is_dir()) {
        return Err(failed(io::Error::other("output is a directory")));
    }

    // Temporary files are private by default. New images get the usual umask based
    // mode and replaced images keep theirs.
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    // If anything fails the temporary file is removed when it's dropped.
    let mut file = builder.tempfile_in(dir).map_err(failed)?;
    if let Some(meta) = existing {
        file.as_file()
            .set_permissions(meta.permissions())
            .map_err(failed)?;
    }
    file.write_all(image.bytes()).map_err(failed)?;
    file.as_file().sync_all().map_err(failed)?;
    file.persist(path).map_err(|e| failed(e.error))?;
    Ok(())
}

fn write_plan(mut out: impl Write, plan: &WritePlan, explain: bool) {
    let mut builder = TableBuilder::new();
    builder.add_col_l("write", "what is being copied into the image");
    builder.add_col_r(
        "dest",
        "address of the first byte written, this is also the offset into the image",
    );
    builder.add_col_r("bytes", "number of bytes copied");
    builder.add_col_r("end", "address after the last byte written");

    for write in plan.writes.iter() {
        add_field!(builder, "write", write.kind);
        add_field!(builder, "dest", "{:x}", write.dest);
        add_field!(builder, "bytes", "{:x}", write.len());
        add_field!(builder, "end", "{:x}", write.dest.saturating_add(write.len()));
    }
    builder.writeln(&mut out, explain);
    uwriteln!(out);
}

fn write_summary(
    mut out: impl Write,
    file: &ElfFile,
    stub: &BootStub,
    end_addr: u64,
    summary: &Summary,
) {
    let mut b = SimpleTableBuilder::new();
    add_simple!(b, "input", file.path.display());
    add_simple!(
        b,
        "type",
        format!("{} {}", file.header.machine(), file.header.stype())
    );
    add_simple!(b, "flags", "{:#x}", file.header.flags);
    add_simple!(b, "stub", stub.path.display());
    add_simple!(b, "entry", "{:#x}", summary.entry);
    add_simple!(b, "end", "{:#x}", end_addr);
    add_simple!(b, "size", "{:#x}", summary.size);
    add_simple!(b, "sha256", summary.digest);
    add_simple!(b, "output", summary.output.display());
    b.writeln(&mut out);
}
