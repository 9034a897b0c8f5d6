use leveler::schema::{optional_group, optional_int32, repeated_group, SchemaBuilder};
use leveler::{decode_spaced, encode_spaced, Result, Value};

/// Encodes a nullable list into a fixed-stride buffer where the null slot
/// keeps a sentinel, then decodes it using the validity bitmap.
///
/// # Schema
/// message schema {
///     optional group a {
///         repeated group list {
///             optional int32 element;
///         }
///     }
/// }
fn main() -> Result<()> {
    let schema = SchemaBuilder::new("schema")
        .field(optional_group(
            "a",
            vec![repeated_group("list", vec![optional_int32("element")])],
        ))
        .build();
    let path = schema.column_path(&["a", "list", "element"])?;

    let records = vec![Value::list([Some(1), None, Some(2), Some(3), Some(4)])];
    let spaced = encode_spaced(&records, &path, 8, -999)?;

    println!("values:      {:?}", spaced.values());
    println!("validity:    {:08b}", spaced.validity().as_bytes()[0]);
    println!("definition:  {:?}", spaced.definition_levels());
    println!("repetition:  {:?}", spaced.repetition_levels());

    for record in decode_spaced(&spaced, &path)? {
        println!("{record}");
    }
    Ok(())
}
