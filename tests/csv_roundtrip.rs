use proptest::prelude::*;
use stockcount_lib::csv::{self, ColumnSet, Delimiter, EncodeOptions};
use stockcount_lib::CountLine;

/// Field content deliberately heavy on delimiter, quote, and newline characters.
fn hostile_field() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just(','),
            Just(';'),
            Just('"'),
            Just('\n'),
            Just(' '),
            proptest::char::range('a', 'z'),
            proptest::char::range('0', '9'),
        ],
        0..24,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn arb_line() -> impl Strategy<Value = CountLine> {
    (
        "[0-9]{13}",
        proptest::option::of(hostile_field()),
        0i64..100_000,
        proptest::option::of(hostile_field()),
        proptest::option::of(hostile_field()),
        0i64..4_102_444_800_000,
    )
        .prop_map(|(ean, name, quantity, location, note, updated_at)| CountLine {
            ean,
            name,
            quantity,
            location,
            note,
            updated_at,
        })
}

fn delimiter() -> impl Strategy<Value = Delimiter> {
    prop_oneof![Just(Delimiter::Comma), Just(Delimiter::Semicolon)]
}

proptest! {
    #[test]
    fn encode_then_decode_preserves_fields(
        lines in proptest::collection::vec(arb_line(), 0..8),
        delim in delimiter(),
    ) {
        let opts = EncodeOptions { delimiter: delim, columns: ColumnSet::Full };
        let text = csv::encode(&lines, &opts);
        let rows = csv::decode(&text, &[delim.as_char()]);

        prop_assert_eq!(rows[0].clone(), ColumnSet::Full.header());
        prop_assert_eq!(rows.len(), lines.len() + 1);
        for (line, row) in lines.iter().zip(rows.iter().skip(1)) {
            let quantity = line.quantity.to_string();
            prop_assert_eq!(row.len(), 6);
            prop_assert_eq!(row[0].as_str(), line.ean.as_str());
            prop_assert_eq!(row[1].as_str(), line.name.as_deref().unwrap_or(""));
            prop_assert_eq!(row[2].as_str(), quantity.as_str());
            prop_assert_eq!(row[3].as_str(), line.location.as_deref().unwrap_or(""));
            prop_assert_eq!(row[4].as_str(), line.note.as_deref().unwrap_or(""));
        }
    }

    #[test]
    fn decoder_never_panics_on_arbitrary_lines(line in "\\PC*") {
        let fields = csv::decode_line(&line, csv::IMPORT_DELIMITERS);
        prop_assert!(!fields.is_empty());
    }

    #[test]
    fn encoded_output_is_line_terminated(
        lines in proptest::collection::vec(arb_line(), 0..4),
    ) {
        let opts = EncodeOptions::default();
        let text = csv::encode(&lines, &opts);
        prop_assert!(text.ends_with('\n'));
    }
}
