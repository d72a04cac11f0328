use std::{fs, path::PathBuf};

use tempfile::tempdir;

use modeller::{ModellerError, catalogue::Relationship, codec};
use modeller_cli::{Args, Command, Emit, run};

/// The sample catalogue shipped in demos/ at the workspace root.
fn demo_catalogue() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
        .join("payments.json")
        .to_string_lossy()
        .to_string()
}

fn args(command: Command) -> Args {
    Args {
        command,
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_compile_demo_catalogue() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("payments.puml");

    run(&args(Command::Compile {
        catalogue: demo_catalogue(),
        elements: vec![],
        title: "Payments".to_string(),
        left_to_right: true,
        enterprise: None,
        emit: Emit::Markup,
        output: Some(output.to_string_lossy().to_string()),
    }))
    .expect("Compile should succeed");

    let markup = fs::read_to_string(&output).expect("Output should exist");
    assert!(markup.starts_with("@startuml\n!include <edgy/edgy>\nleft to right direction\n"));
    assert!(markup.ends_with("@enduml\n"));
    assert!(markup.contains("$link(CustomerPortal, PaymentGateway, \"Uses\")"));
    assert!(markup.contains("$link(organisation, product, \"Makes\")"));
    assert!(markup.contains("$journey(\"Buy & Return\", Buy_And_Return)"));
    assert!(markup.contains("note right of PaymentGateway #red"));
}

#[test]
fn e2e_compile_is_deterministic() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let first = temp_dir.path().join("first.txt");
    let second = temp_dir.path().join("second.txt");

    for (elements, output) in [(vec![4, 2, 1], &first), (vec![1, 4, 2], &second)] {
        run(&args(Command::Compile {
            catalogue: demo_catalogue(),
            elements,
            title: "Subset".to_string(),
            left_to_right: false,
            enterprise: None,
            emit: Emit::Token,
            output: Some(output.to_string_lossy().to_string()),
        }))
        .expect("Compile should succeed");
    }

    let token = fs::read_to_string(&first).unwrap();
    assert_eq!(token, fs::read_to_string(&second).unwrap());
    let markup = codec::decode(&token).expect("Token should decode");
    assert_eq!(markup.matches("$link(").count(), 2);
}

#[test]
fn e2e_encode_decode_roundtrip() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("input.puml");
    let token_file = temp_dir.path().join("token.txt");
    let decoded = temp_dir.path().join("decoded.puml");
    let markup = "@startuml\nBob -> Alice : hello\n@enduml\n";
    fs::write(&input, markup).unwrap();

    run(&args(Command::Encode {
        input: input.to_string_lossy().to_string(),
        output: Some(token_file.to_string_lossy().to_string()),
    }))
    .expect("Encode should succeed");

    let token = fs::read_to_string(&token_file).unwrap();
    run(&args(Command::Decode {
        token,
        output: Some(decoded.to_string_lossy().to_string()),
    }))
    .expect("Decode should succeed");

    assert_eq!(fs::read_to_string(&decoded).unwrap(), markup);
}

#[test]
fn e2e_element_url() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("url.txt");

    run(&args(Command::Element {
        catalogue: demo_catalogue(),
        id: 3,
        emit: Emit::Url,
        output: Some(output.to_string_lossy().to_string()),
    }))
    .expect("Element diagram should succeed");

    let url = fs::read_to_string(&output).unwrap();
    assert!(url.starts_with("https://www.plantuml.com/plantuml/svg/"));
}

#[test]
fn e2e_unknown_element_fails() {
    let result = run(&args(Command::Element {
        catalogue: demo_catalogue(),
        id: 999,
        emit: Emit::Markup,
        output: None,
    }));
    assert!(matches!(result, Err(ModellerError::NotFound { id: 999, .. })));
}

#[test]
fn e2e_malformed_token_fails() {
    let result = run(&args(Command::Decode {
        token: "not a token!".to_string(),
        output: None,
    }));
    assert!(matches!(result, Err(ModellerError::Codec(_))));
}

#[test]
fn e2e_derive_relationships() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("derived.json");

    run(&args(Command::DeriveRelationships {
        catalogue: demo_catalogue(),
        output: Some(output.to_string_lossy().to_string()),
    }))
    .expect("Derive should succeed");

    let proposed: Vec<Relationship> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(proposed.contains(&Relationship::new(4, 3, "requires")));
    assert!(proposed.contains(&Relationship::new(6, 8, "features in")));
    assert!(!proposed.contains(&Relationship::new(5, 6, "makes")));
}

#[test]
fn e2e_missing_catalogue_fails() {
    let result = run(&args(Command::Compile {
        catalogue: "does/not/exist.json".to_string(),
        elements: vec![],
        title: "Nothing".to_string(),
        left_to_right: false,
        enterprise: None,
        emit: Emit::Markup,
        output: None,
    }));
    assert!(matches!(result, Err(ModellerError::Io(_))));
}
