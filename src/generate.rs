use async_trait::async_trait;
use std::time::Duration;

use crate::api::{ApiMessage, OllamaClient};
use crate::classify::classify;
use crate::error::AssistantError;
use crate::extract::extract_tagged_block;
use crate::naming::extract_class_name;
use crate::session::{LogLevel, Session};

const UNIT_TEST_TIMEOUT: Duration = Duration::from_secs(60);
const INTEGRATION_TEST_TIMEOUT: Duration = Duration::from_secs(120);
const DOCUMENTATION_TIMEOUT: Duration = Duration::from_secs(120);
const OPENAPI_TIMEOUT: Duration = Duration::from_secs(60);
const DOCKER_TIMEOUT: Duration = Duration::from_secs(60);
const WORKFLOW_TIMEOUT: Duration = Duration::from_secs(60);

/// One tier of the fallback chain: a way to get a chat completion. Tiers
/// are tried in order until one succeeds.
#[async_trait]
pub trait ChatTier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(
        &self,
        messages: &[ApiMessage],
        timeout: Duration,
    ) -> Result<String, AssistantError>;
}

struct DirectTier(OllamaClient);

#[async_trait]
impl ChatTier for DirectTier {
    fn name(&self) -> &'static str {
        "direct API"
    }

    async fn attempt(
        &self,
        messages: &[ApiMessage],
        timeout: Duration,
    ) -> Result<String, AssistantError> {
        self.0.chat(messages, timeout).await
    }
}

struct LibraryTier(OllamaClient);

#[async_trait]
impl ChatTier for LibraryTier {
    fn name(&self) -> &'static str {
        "ollama-rs client"
    }

    async fn attempt(
        &self,
        messages: &[ApiMessage],
        _timeout: Duration,
    ) -> Result<String, AssistantError> {
        self.0.chat_via_library(messages).await
    }
}

/// Runs the supplementary generation flows (tests, docs, OpenAPI, Docker,
/// CI). Every flow has the same shape: build a (system, user) prompt pair,
/// walk the tier chain, extract the dominant block, register the result as
/// a named artifact.
pub struct Generator {
    tiers: Vec<Box<dyn ChatTier>>,
}

impl Generator {
    pub fn new(client: OllamaClient) -> Self {
        Self {
            tiers: vec![
                Box::new(DirectTier(client.clone())),
                Box::new(LibraryTier(client)),
            ],
        }
    }

    /// Test constructor: a custom tier list.
    pub fn with_tiers(tiers: Vec<Box<dyn ChatTier>>) -> Self {
        Self { tiers }
    }

    async fn complete(
        &self,
        session: &mut Session,
        system_prompt: &str,
        user_prompt: &str,
        timeout: Duration,
    ) -> Result<String, AssistantError> {
        let messages = [
            ApiMessage::system(system_prompt),
            ApiMessage::user(user_prompt),
        ];

        let mut last_error: Option<AssistantError> = None;
        for tier in &self.tiers {
            match tier.attempt(&messages, timeout).await {
                Ok(text) => {
                    session.log(LogLevel::Info, format!("{} call succeeded", tier.name()));
                    return Ok(text);
                }
                Err(e) => {
                    session.log(
                        LogLevel::Warning,
                        format!("{} call failed: {}", tier.name(), e),
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(AssistantError::Generation(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no chat tiers configured".to_string()),
        ))
    }

    /// Generates a unit-test class for one stored Java file. The class role
    /// (controller/service/repository/entity) only shapes the prompt's test
    /// style label; the pipeline is the same for all of them.
    pub async fn generate_unit_test(
        &self,
        session: &mut Session,
        filename: &str,
    ) -> Result<String, AssistantError> {
        let content = session
            .main_files()
            .get(filename)
            .cloned()
            .ok_or_else(|| AssistantError::Generation(format!("no such file: {}", filename)))?;

        let class_name = extract_class_name(&content).ok_or_else(|| {
            AssistantError::Generation("couldn't identify a class name to test".to_string())
        })?;
        let test_class_name = format!("{}Test", class_name);
        let test_style = test_style_for(&content);

        let system_prompt = format!(
            "You are an expert Java Spring Boot test generator.\n\
             Generate complete {} for the following Java class.\n\
             The test class should follow best practices and include meaningful assertions.\n\
             Format the response as pure Java code without any explanations or markdown.",
            test_style
        );

        let user_prompt = format!(
            "Generate Spring Boot tests for this class:\n\n\
             ```java\n{}\n```\n\n\
             Requirements:\n\
             1. Name the test class {}\n\
             2. Use appropriate testing libraries (JUnit 5, Mockito, etc.)\n\
             3. Test all public methods with good coverage\n\
             4. Include proper mocking of dependencies\n\
             5. Follow standard test naming conventions (given/when/then)\n\
             6. Include detailed comments explaining each test case",
            content, test_class_name
        );

        session.log(
            LogLevel::Info,
            format!("generating {} for {}", test_style, filename),
        );

        let response = self
            .complete(session, &system_prompt, &user_prompt, UNIT_TEST_TIMEOUT)
            .await?;
        let test_code = extract_tagged_block(&response, &["java"]).unwrap_or(response);

        let test_filename = format!("{}.java", test_class_name);
        session.register_test_file(&test_filename, &test_code);
        Ok(test_filename)
    }

    /// Generates one integration-test class covering every stored Java file.
    pub async fn generate_integration_tests(
        &self,
        session: &mut Session,
    ) -> Result<String, AssistantError> {
        let mut files_content = String::new();
        for (filename, content) in session.main_files() {
            if filename.ends_with(".java") {
                files_content.push_str(&format!("\n\n{}:\n```java\n{}\n```", filename, content));
            }
        }

        let system_prompt = "You are an expert Spring Boot integration test generator.\n\
             Generate a comprehensive integration test class that tests the REST APIs defined in the provided files.\n\
             The test should use MockMvc, @SpringBootTest, and include HTTP requests to test endpoints.\n\
             Format the response as pure Java code without any explanations or markdown.";

        let user_prompt = format!(
            "Generate Spring Boot integration tests for the following files:\n{}\n\n\
             Requirements:\n\
             1. Name the test class ApplicationIntegrationTest\n\
             2. Use @SpringBootTest and TestRestTemplate or WebTestClient\n\
             3. Test all REST API endpoints\n\
             4. Include tests for success, validation and error conditions\n\
             5. Add appropriate assertions for response status and body\n\
             6. Include detailed comments explaining the test setup and assertions",
            files_content
        );

        session.log(LogLevel::Info, "generating integration tests");

        let response = self
            .complete(session, system_prompt, &user_prompt, INTEGRATION_TEST_TIMEOUT)
            .await?;
        let test_code = extract_tagged_block(&response, &["java"]).unwrap_or(response);

        let test_filename = "ApplicationIntegrationTest.java";
        session.register_test_file(test_filename, &test_code);
        Ok(test_filename.to_string())
    }

    /// Generates project documentation in Markdown, registered as README.md
    /// so the organizer routes it to the project root.
    pub async fn generate_documentation(
        &self,
        session: &mut Session,
    ) -> Result<String, AssistantError> {
        let mut files_content = String::new();
        for (filename, content) in session.main_files() {
            let file_type = classify(content, None);
            files_content.push_str(&format!(
                "\n\n{}:\n```{}\n{}\n```",
                filename, file_type, content
            ));
        }

        let system_prompt = "You are an expert Spring Boot developer and technical writer.\n\
             Generate comprehensive documentation for the provided Spring Boot project.\n\
             The documentation should include:\n\
             1. Overview of the project architecture\n\
             2. API documentation for all REST endpoints\n\
             3. Description of key components and their relationships\n\
             4. Setup and configuration instructions\n\
             5. Examples of API usage with curl commands\n\n\
             Format the response in clean, well-structured Markdown.";

        let metadata = session.metadata.clone();
        let user_prompt = format!(
            "Create comprehensive documentation for this Spring Boot project:\n{}\n\n\
             Project Details:\n\
             - Name: {}\n\
             - Group ID: {}\n\
             - Artifact ID: {}\n\
             - Description: {}\n\
             - Java Version: {}\n\
             - Spring Boot Version: {}\n\n\
             Include:\n\
             1. Project overview and architecture diagram (described in text)\n\
             2. API documentation with endpoints, methods, request/response examples\n\
             3. Database schema description (if applicable)\n\
             4. Setup and configuration guide\n\
             5. Sample curl commands for testing APIs",
            files_content,
            metadata.app_name,
            metadata.group_id,
            metadata.artifact_id,
            metadata.description,
            metadata.java_version,
            metadata.spring_boot_version
        );

        session.log(LogLevel::Info, "generating project documentation");

        // Documentation stays raw: the whole response is the artifact.
        let documentation = self
            .complete(session, system_prompt, &user_prompt, DOCUMENTATION_TIMEOUT)
            .await?;

        session.register_config_file("README.md", &documentation);
        Ok("README.md".to_string())
    }

    /// Generates an OpenAPI 3.0 spec from the stored controller files.
    pub async fn generate_openapi_spec(
        &self,
        session: &mut Session,
    ) -> Result<String, AssistantError> {
        let mut controllers_content = String::new();
        for (filename, content) in session.main_files() {
            if filename.ends_with(".java")
                && (content.contains("@RestController") || content.contains("@Controller"))
            {
                controllers_content
                    .push_str(&format!("\n\n{}:\n```java\n{}\n```", filename, content));
            }
        }

        if controllers_content.is_empty() {
            return Err(AssistantError::Generation(
                "no controller files found in the project".to_string(),
            ));
        }

        let system_prompt = "You are an expert in OpenAPI specification generation.\n\
             Create a complete OpenAPI 3.0 specification for the Spring Boot REST controllers provided.\n\
             The specification should include all endpoints, request/response schemas, and proper documentation.\n\
             Format the response as a YAML OpenAPI specification.";

        let user_prompt = format!(
            "Generate an OpenAPI 3.0 specification for the following Spring Boot REST controllers:\n{}\n\n\
             Project Details:\n\
             - Name: {}\n\
             - Description: {}\n\
             - Version: 1.0.0\n\n\
             Requirements:\n\
             1. Include all REST endpoints with proper paths, methods, and parameters\n\
             2. Define request and response schemas based on the Java objects used\n\
             3. Add detailed descriptions for all operations and schemas\n\
             4. Include example values where appropriate\n\
             5. Format as a valid OpenAPI 3.0 YAML specification",
            controllers_content, session.metadata.app_name, session.metadata.description
        );

        session.log(LogLevel::Info, "generating OpenAPI specification");

        let response = self
            .complete(session, system_prompt, &user_prompt, OPENAPI_TIMEOUT)
            .await?;
        let spec = extract_tagged_block(&response, &["yaml", "yml"]).unwrap_or(response);

        session.register_config_file("openapi.yml", &spec);
        Ok("openapi.yml".to_string())
    }

    /// Generates a Dockerfile and, when the response carries one, a
    /// docker-compose.yml.
    pub async fn generate_docker_files(
        &self,
        session: &mut Session,
    ) -> Result<Vec<String>, AssistantError> {
        let system_prompt = "You are an expert in containerization for Spring Boot applications.\n\
             Generate a Dockerfile and docker-compose.yml file for a Spring Boot application.\n\
             The Dockerfile should follow best practices for Java applications.\n\
             Include multi-stage build for optimized container size.\n\
             The docker-compose.yml should include the application and any necessary services.";

        let metadata = session.metadata.clone();
        let user_prompt = format!(
            "Create a Dockerfile and docker-compose.yml for this Spring Boot project:\n\n\
             Project Details:\n\
             - Name: {}\n\
             - Java Version: {}\n\
             - Spring Boot Version: {}\n\n\
             The Docker setup should:\n\
             1. Use multi-stage build for optimization\n\
             2. Include appropriate JVM tuning options\n\
             3. Set up the application with proper security practices\n\
             4. Include any necessary databases or services based on the application\n\
             5. Configure health checks and proper networking\n\n\
             The application uses Spring Boot {} and Java {}.",
            metadata.app_name,
            metadata.java_version,
            metadata.spring_boot_version,
            metadata.spring_boot_version,
            metadata.java_version
        );

        session.log(LogLevel::Info, "generating Docker configuration");

        let response = self
            .complete(session, system_prompt, &user_prompt, DOCKER_TIMEOUT)
            .await?;

        let mut registered = Vec::new();

        let dockerfile =
            extract_tagged_block(&response, &["dockerfile"]).unwrap_or_else(|| response.clone());
        session.register_config_file("Dockerfile", &dockerfile);
        registered.push("Dockerfile".to_string());

        if let Some(compose) = extract_tagged_block(&response, &["yaml", "yml"]) {
            session.register_config_file("docker-compose.yml", &compose);
            registered.push("docker-compose.yml".to_string());
        }

        Ok(registered)
    }

    /// Generates a GitHub Actions CI/CD workflow.
    pub async fn generate_ci_workflow(
        &self,
        session: &mut Session,
    ) -> Result<String, AssistantError> {
        let system_prompt = "You are an expert in CI/CD for Java Spring Boot applications.\n\
             Create a complete GitHub Actions workflow file for building, testing, and deploying a Spring Boot application.\n\
             The workflow should include proper caching, testing, and deployment steps.";

        let metadata = session.metadata.clone();
        let user_prompt = format!(
            "Generate a GitHub Actions workflow file for this Spring Boot project:\n\n\
             Project Details:\n\
             - Name: {}\n\
             - Java Version: {}\n\
             - Spring Boot Version: {}\n\
             - Build Tool: Maven\n\n\
             Requirements:\n\
             1. Create a workflow that builds and tests the application on push to main and pull requests\n\
             2. Include proper Java setup with caching for Maven dependencies\n\
             3. Run unit and integration tests\n\
             4. Build and publish a Docker image\n\
             5. Add a deployment step (to a staging environment)\n\
             6. Include security scanning for vulnerabilities\n\
             7. Format as a YAML file for .github/workflows/ci-cd.yml",
            metadata.app_name, metadata.java_version, metadata.spring_boot_version
        );

        session.log(LogLevel::Info, "generating GitHub Actions workflow");

        let response = self
            .complete(session, system_prompt, &user_prompt, WORKFLOW_TIMEOUT)
            .await?;
        let workflow = extract_tagged_block(&response, &["yaml", "yml"]).unwrap_or(response);

        session.register_config_file("ci-cd.yml", &workflow);
        Ok("ci-cd.yml".to_string())
    }
}

/// Human-readable test style for the prompt, chosen by role annotation in
/// priority order. Purely cosmetic; it does not change the pipeline.
pub fn test_style_for(content: &str) -> &'static str {
    if content.contains("@Controller") || content.contains("@RestController") {
        "MockMvc controller tests"
    } else if content.contains("@Service") {
        "service unit tests with Mockito"
    } else if content.contains("@Repository") {
        "repository tests with @DataJpaTest"
    } else if content.contains("@Entity") {
        "entity class validation tests"
    } else {
        "JUnit tests"
    }
}
