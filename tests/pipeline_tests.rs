// End-to-end pipeline coverage: a chat response goes through extraction,
// classification, naming, session registration, layout, and archiving.

use pretty_assertions::assert_eq;
use std::collections::HashMap;

use bootsmith::archive::{build_plain_zip, list_zip_entries};
use bootsmith::classify::{classify, FileType};
use bootsmith::extract::extract_code_blocks;
use bootsmith::naming::{suggest_filename, Category};
use bootsmith::organize::{organize_project_files, DirRole};
use bootsmith::session::Session;

const RESPONSE: &str = r#"Here is a small service layer.

First the service:

```java
import org.springframework.stereotype.Service;

@Service
public class OrderService {
    public String describe() { return "orders"; }
}
```

Then its configuration:

```properties
spring.datasource.url=jdbc:h2:mem:orders
server.port=8080
```

And a unit test:

```java
import org.junit.jupiter.api.Test;

public class OrderServiceTest {
    @Test
    void describes() {}
}
```
"#;

fn register_response(session: &mut Session, response: &str) {
    for block in extract_code_blocks(response) {
        session.register_block(&block);
    }
}

#[test]
fn blocks_are_extracted_in_document_order() {
    let blocks = extract_code_blocks(RESPONSE);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].language.as_deref(), Some("java"));
    assert!(blocks[0].code.contains("@Service"));
    assert_eq!(blocks[1].language.as_deref(), Some("properties"));
    assert_eq!(blocks[2].language.as_deref(), Some("java"));
    assert!(blocks[2].code.contains("@Test"));
}

#[test]
fn service_class_is_named_after_its_class() {
    let code = "@Service\npublic class OrderService {}";
    assert_eq!(classify(code, Some("java")), FileType::Java);
    let (filename, category) = suggest_filename(code, FileType::Java);
    assert_eq!(filename, "OrderService.java");
    assert_eq!(category, Category::Main);
}

#[test]
fn datasource_properties_become_application_properties() {
    let code = "spring.datasource.url=jdbc:h2:mem:orders";
    let file_type = classify(code, None);
    assert_eq!(file_type, FileType::Properties);
    let (filename, category) = suggest_filename(code, file_type);
    assert_eq!(filename, "application.properties");
    assert_eq!(category, Category::Config);
}

#[test]
fn registered_response_produces_the_expected_artifacts() {
    let mut session = Session::new();
    register_response(&mut session, RESPONSE);

    let files = session.all_files();
    assert!(files.contains_key("OrderService.java"));
    assert!(files.contains_key("application.properties"));
    assert!(files.contains_key("OrderServiceTest.java"));
    assert_eq!(files.len(), 3);
}

#[test]
fn colliding_names_with_new_content_get_numeric_suffixes() {
    let mut session = Session::new();
    register_response(&mut session, RESPONSE);

    // Same class name, different body: must not clobber the stored file.
    let follow_up = "```java\npublic class OrderService { int version = 2; }\n```";
    register_response(&mut session, follow_up);

    let files = session.all_files();
    assert!(files.contains_key("OrderService.java"));
    assert!(files.contains_key("OrderService_1.java"));
    assert!(files["OrderService_1.java"].contains("version = 2"));
}

#[test]
fn layout_routes_each_artifact_to_one_conventional_directory() {
    let mut session = Session::new();
    register_response(&mut session, RESPONSE);

    let layout = organize_project_files(&session.all_files());
    assert!(layout[&DirRole::MainSource].contains_key("OrderService.java"));
    assert!(layout[&DirRole::MainResource].contains_key("application.properties"));
    assert!(layout[&DirRole::TestSource].contains_key("OrderServiceTest.java"));

    let total: usize = layout.values().map(|files| files.len()).sum();
    assert_eq!(total, 3);
}

#[test]
fn plain_archive_mirrors_the_layout() {
    let mut session = Session::new();
    register_response(&mut session, RESPONSE);

    let bytes = build_plain_zip(&session.all_files()).expect("zip builds");
    let mut entries = list_zip_entries(&bytes).expect("zip lists");
    entries.sort();

    assert_eq!(
        entries,
        vec![
            "src/main/java/OrderService.java".to_string(),
            "src/main/resources/application.properties".to_string(),
            "src/test/java/OrderServiceTest.java".to_string(),
        ]
    );
}

#[test]
fn root_artifacts_archive_at_the_top_level() {
    let files = HashMap::from([
        ("README.md".to_string(), "# Demo project".to_string()),
        (
            "Dockerfile".to_string(),
            "FROM eclipse-temurin:17\nCOPY target/app.jar app.jar".to_string(),
        ),
        (
            "pom.xml".to_string(),
            "<?xml version=\"1.0\"?>\n<project></project>".to_string(),
        ),
    ]);

    let bytes = build_plain_zip(&files).expect("zip builds");
    let entries = list_zip_entries(&bytes).expect("zip lists");

    assert!(entries.contains(&"README.md".to_string()));
    assert!(entries.contains(&"Dockerfile".to_string()));
    assert!(entries.contains(&"pom.xml".to_string()));
}

#[test]
fn unhinted_blocks_still_classify_by_content() {
    let response = "```\n<project><modelVersion>4.0.0</modelVersion></project>\n```";
    let mut session = Session::new();
    register_response(&mut session, response);

    let files = session.all_files();
    assert_eq!(files.len(), 1);
    assert!(files.keys().next().map(|name| name.ends_with(".xml")).unwrap_or(false));
}
