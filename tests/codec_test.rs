use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use huffman_toy::{compress, decompress, Alphabet, CodeTree, HuffmanCodec, Symbol};

fn get_test_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

const DISPLAY_LEN: usize = 16;

fn display_data(data: &[u8]) -> String {
    data.iter()
        .take(DISPLAY_LEN)
        .map(|&b| format!("{:02x} ", b))
        .collect::<String>()
}

const DATA_FILES_CONFIG: &str = "manifest.json";

/// Get the fixture map (deflated file -> alphabet) in json format
fn get_data_files(file: &str) -> HashMap<String, Alphabet> {
    let data_files_path = get_test_dir().join(file);
    let data_files = std::fs::read_to_string(data_files_path).unwrap();
    serde_json::from_str(&data_files).unwrap()
}

/// Fixtures are stored DEFLATE-compressed; inflate one back to its raw bytes.
fn inflate_fixture(name: &str) -> Vec<u8> {
    let deflated = std::fs::read(get_test_dir().join(name)).unwrap();
    miniz_oxide::inflate::decompress_to_vec(&deflated).unwrap()
}

fn fixture_text(name: &str) -> Vec<char> {
    String::from_utf8(inflate_fixture(name))
        .unwrap()
        .chars()
        .collect()
}

fn round_trip<S: Symbol>(name: &str, symbols: &[S]) -> huffman_toy::Result<()> {
    let (tree, compressed) = compress(symbols)?;

    println!(
        "{}: {} symbols -> {} bytes\n{}",
        name,
        symbols.len(),
        compressed.len(),
        display_data(&compressed)
    );

    let decompressed = decompress(&compressed, tree.as_ref())?;
    assert_eq!(decompressed, symbols, "{name} did not round trip");

    match tree {
        Some(tree) => {
            let distinct: BTreeSet<S> = symbols.iter().copied().collect();
            assert_eq!(tree.leaf_count(), distinct.len());
            assert_eq!(tree.weight(), symbols.len() as u64);
        }
        None => assert!(symbols.is_empty() && compressed.is_empty()),
    }
    Ok(())
}

#[test]
fn test_manifest_fixtures_round_trip() -> huffman_toy::Result<()> {
    let data_files = get_data_files(DATA_FILES_CONFIG);
    assert!(!data_files.is_empty());
    for (file, alphabet) in data_files {
        match alphabet {
            Alphabet::Bytes => round_trip(&file, &inflate_fixture(&file))?,
            Alphabet::Text => round_trip(&file, &fixture_text(&file))?,
        }
    }
    Ok(())
}

#[test]
fn test_skewed_prose_uses_fewer_than_eight_bits_per_char() -> huffman_toy::Result<()> {
    for name in ["lorem_ipsum.deflate", "two_cities.deflate"] {
        let text = fixture_text(name);
        let codec = HuffmanCodec::from_symbols(&text)?;
        let bits = codec.encode_bits(&text)?;
        assert!(bits.len() < 8 * text.len(), "{name}: {} bits", bits.len());
    }
    Ok(())
}

#[test]
fn test_single_symbol_fixture_costs_one_bit_each() -> huffman_toy::Result<()> {
    let text = fixture_text("repeat_1.deflate");
    let codec = HuffmanCodec::from_symbols(&text)?;
    assert_eq!(codec.table().get(&'a').map(|c| c.to_string()), Some("0".to_string()));
    assert_eq!(codec.encode_bits(&text)?.len(), text.len());
    Ok(())
}

#[test]
fn test_persisted_tree_decodes_later() -> huffman_toy::Result<()> {
    let text = fixture_text("unicode.deflate");
    let (tree, compressed) = compress(&text)?;
    let json = tree.expect("non-empty input has a tree").to_json()?;

    let reloaded = CodeTree::<char>::from_json(&json)?;
    assert_eq!(decompress(&compressed, Some(&reloaded))?, text);
    Ok(())
}

#[test]
fn test_tree_from_other_input_cannot_encode() {
    let codec = HuffmanCodec::from_symbols(&fixture_text("two_cities.deflate")).unwrap();
    let result = codec.encode_bits(&fixture_text("unicode.deflate"));
    assert!(matches!(
        result,
        Err(huffman_toy::Error::UnresolvedSymbol { .. })
    ));
}
