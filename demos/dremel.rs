use leveler::schema::{repeated_group, string, SchemaBuilder};
use leveler::{decode, encode, ByteArray, Result, Value};

/// # Schema
/// message doc {
///     repeated group Name {
///         repeated group Language {
///             required string Code;
///         }
///     }
/// }
fn main() -> Result<()> {
    let schema = SchemaBuilder::new("doc")
        .field(repeated_group(
            "Name",
            vec![repeated_group("Language", vec![string("Code")])],
        ))
        .build();
    println!("{schema}");

    let path = schema.column_path(&["Name", "Language", "Code"])?;

    let code = |code: &str| Value::Leaf(ByteArray::from(code));
    let records = vec![
        Value::list([
            Value::list([code("en-us"), code("en")]), // 0
            Value::List(vec![]),                      // 1
            Value::list([code("en-gb")]),             // 2
        ]),
        Value::list([Value::List(vec![])]),
    ];

    let column = encode(&records, &path)?;
    let mut values = column.values().iter();
    println!("{:<8} {:>3} {:>3}", "value", "r", "d");
    for (def, rep) in column
        .definition_levels()
        .iter()
        .zip(column.repetition_levels())
    {
        let value = if *def == path.max_definition_level() {
            values.next().map(ToString::to_string)
        } else {
            None
        };
        println!(
            "{:<8} {:>3} {:>3}",
            value.as_deref().unwrap_or("NULL"),
            rep,
            def
        );
    }

    for record in decode(&column, &path)? {
        println!("{record}");
    }
    Ok(())
}
