use leveler::schema::{optional_group, optional_int32, repeated_group};
use leveler::{ColumnWriter, Result, SchemaBuilder, WriterProperties};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Writes one spaced batch of a nullable list column and reads it back in
/// bounded batches.
fn main() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {e}");
    }

    if let Err(e) = run() {
        println!("ERROR");
        println!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let schema = SchemaBuilder::new("schema")
        .field(optional_group(
            "a",
            vec![repeated_group("list", vec![optional_int32("element")])],
        ))
        .build();
    info!("{schema}");

    let path = schema.column_path(&["a", "list", "element"])?;
    info!(
        path = %path,
        max_definition_level = path.max_definition_level(),
        max_repetition_level = path.max_repetition_level(),
        "resolved column"
    );

    // [1, null, 2, 3, 4] with a sentinel in the null slot
    let mut writer = ColumnWriter::<i32>::new(path, WriterProperties::default())?;
    let written = writer.write_batch_spaced(
        5,
        Some(&[3, 2, 3, 3, 3]),
        Some(&[0, 1, 1, 1, 1]),
        Some(&[0b11101]),
        0,
        &[1, -999, 2, 3, 4],
    )?;
    let chunk = writer.close();
    let metadata = chunk.metadata();
    info!(
        written,
        rows = metadata.num_rows,
        levels = metadata.num_levels,
        values = metadata.num_values,
        nulls = metadata.null_count,
        "wrote column chunk"
    );

    let mut reader = chunk.reader()?;
    while reader.has_next() {
        let (mut definition_levels, mut repetition_levels, mut values) = (vec![], vec![], vec![]);
        let read = reader.read_batch(
            3,
            &mut definition_levels,
            &mut repetition_levels,
            &mut values,
        );
        info!(
            levels_read = read.levels_read,
            values_read = read.values_read,
            short = read.is_short(),
            ?definition_levels,
            ?repetition_levels,
            ?values,
            "read batch"
        );
    }

    for record in chunk.decode()? {
        info!("record: {record}");
    }
    Ok(())
}
