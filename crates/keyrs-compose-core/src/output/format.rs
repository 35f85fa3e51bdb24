// Keyrs Compose Table Emission
// Writes the tables as C arrays of 16-bit literals, one row per line

use std::io::{self, Write};

use crate::classify::AlgorithmicWitness;
use crate::table::{CompactTable, FlatTable, MultiOutputTable};

const GENERATED_NOTICE: &str = "/* Generated by keyrs-compose from the X.Org Compose sequences.\n * Do not edit by hand.\n */";

/// Render one row as `0xhhhh, ` literals
pub fn format_row(row: &[u16]) -> String {
    let mut line = String::with_capacity(row.len() * 8);
    for value in row {
        line.push_str(&format!("0x{:04X}, ", value));
    }
    line.truncate(line.trim_end().len());
    line
}

fn write_rows<'a, W, I>(out: &mut W, rows: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a [u16]>,
{
    for row in rows {
        writeln!(out, "  {}", format_row(row))?;
    }
    Ok(())
}

/// Emit the compact table: header rows first, then the data rows
pub fn write_compact<W: Write>(out: &mut W, table: &CompactTable) -> io::Result<()> {
    writeln!(out, "{}", GENERATED_NOTICE)?;
    writeln!(out)?;
    writeln!(out, "static const guint16 gtk_compose_seqs_compact[] = {{")?;
    for row in table.header_rows() {
        writeln!(out, "  {}", format_row(&row))?;
    }
    write_rows(out, table.data_rows())?;
    writeln!(out, "}};")
}

/// Emit the multi-output table with its two column widths
pub fn write_multi<W: Write>(out: &mut W, table: &MultiOutputTable) -> io::Result<()> {
    writeln!(out, "{}", GENERATED_NOTICE)?;
    writeln!(out)?;
    writeln!(
        out,
        "static const gint compose_multi_max_sequence_len = {};",
        table.max_sequence_len()
    )?;
    writeln!(
        out,
        "static const gint compose_multi_max_codepoint_len = {};",
        table.max_output_len()
    )?;
    writeln!(out)?;
    writeln!(out, "static const guint16 gtk_compose_seqs_multi[] = {{")?;
    write_rows(out, table.rows().iter().map(Vec::as_slice))?;
    writeln!(out, "}};")
}

/// Emit the fixed-width Win32 table
pub fn write_flat<W: Write>(out: &mut W, table: &FlatTable) -> io::Result<()> {
    writeln!(out, "{}", GENERATED_NOTICE)?;
    writeln!(out)?;
    writeln!(out, "static const guint16 gtk_compose_seqs_win32[] = {{")?;
    write_rows(out, table.rows().iter().map(|row| row.as_slice()))?;
    writeln!(out, "}};")
}

/// List algorithmic witnesses, one per line
pub fn write_algorithmic<W: Write>(
    out: &mut W,
    witnesses: &[AlgorithmicWitness],
) -> io::Result<()> {
    for witness in witnesses {
        write!(
            out,
            "0x{:04X}, {}, seq: [ <0x{:04X}>,",
            u32::from(witness.composed),
            witness.composed,
            witness.anchor
        )?;
        for modifier in &witness.modifiers {
            write!(out, " <0x{:04X}>,", modifier)?;
        }
        let verdict = if witness.matches_declared() {
            "verified"
        } else {
            "differs from declared"
        };
        writeln!(out, " ], recomposed as {} {}", witness.composed, verdict)?;
    }
    Ok(())
}
