use mock_generator::{
    generate_mocks, Capability, Config, CustomProducer, EntryKey, Evaluation, Manifest, MockCompiler,
    MockExpression,
};
use openapi_parser::{ApiEndpoint, HttpMethod, OpenApiParser};
use serde_json::{json, Value};

const PETSTORE: &str = r#"
openapi: "3.0.3"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      operationId: listPets
      summary: List pets
      tags: [pet]
      responses:
        '200':
          description: A list of pets
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'
  /pets/{id}:
    get:
      operationId: getPet
      tags: [pet]
      responses:
        '200':
          $ref: '#/components/responses/PetResponse'
        '404':
          description: Not found
  /api/v1/stores:
    get:
      responses:
        '200':
          description: Stores
          content:
            application/json:
              schema:
                type: object
                properties:
                  total:
                    type: integer
                  status:
                    type: string
                    enum: [open, closed]
                additionalProperties:
                  type: boolean
components:
  schemas:
    Pet:
      type: object
      properties:
        id:
          type: integer
        name:
          type: string
        created_at:
          type: string
        owner:
          $ref: '#/components/schemas/Owner'
        tag:
          type: string
          nullable: true
    Owner:
      allOf:
        - type: object
          properties:
            email:
              type: string
            pets:
              type: array
              items:
                $ref: '#/components/schemas/Pet'
        - nullable: true
  responses:
    PetResponse:
      description: A pet
      content:
        application/json:
          schema:
            $ref: '#/components/schemas/Pet'
          examples:
            rex:
              $ref: '#/components/examples/Rex'
  examples:
    Rex:
      value:
        id: 1
        name: Rex
"#;

fn endpoint<'a>(endpoints: &'a [ApiEndpoint], path: &str) -> &'a ApiEndpoint {
    endpoints.iter().find(|e| e.path == path).unwrap()
}

#[test]
fn test_full_pipeline() {
    let document = OpenApiParser::parse(PETSTORE).unwrap();
    let selected: Vec<&ApiEndpoint> = document.endpoints.iter().collect();
    let organized = document.organize(&selected);

    // the Pet -> Owner -> Pet cycle is cut in each traversal
    assert!(organized.errors.iter().all(|e| e.is_warning()));

    let run = generate_mocks(&organized.value, &Config::default());
    assert!(run.errors.is_empty());
    assert_eq!(run.endpoints.len(), 3);

    let list = run.endpoints[0].responses[0].evaluation.value().unwrap();
    let pets = list.as_array().unwrap();
    assert_eq!(pets.len(), 5);
    for pet in pets {
        assert!(pet["id"].is_u64());
        assert!(pet["name"].is_string());
        assert!(pet["owner"]["email"].as_str().unwrap().contains('@'));
        assert_eq!(pet["owner"]["pets"], Value::Array(vec![Value::Null; 5]));
    }

    let single = &run.endpoints[1];
    assert_eq!(single.responses[0].evaluation, Evaluation::Static(json!({"id": 1, "name": "Rex"})));
    assert_eq!(single.responses[1].evaluation, Evaluation::Static(Value::Null));

    let stores = run.endpoints[2].responses[0].evaluation.value().unwrap();
    let stores = stores.as_object().unwrap();
    assert_eq!(stores.len(), 3);
    assert!(["open", "closed"].contains(&stores["status"].as_str().unwrap()));

    let manifest = Manifest::from_run(&run);
    let pets_entry = manifest.get("GET", "/pets").unwrap();
    assert_eq!(pets_entry.mock_file, "get-pets.js");
    assert_eq!(pets_entry.nullable_paths, vec!["owner", "tag"]);
    assert_eq!(manifest.get("GET", "/api/v1/stores").unwrap().operation_id, "get_api_v1_stores");
}

#[test]
fn test_pipeline_is_deterministic() {
    let document = OpenApiParser::parse(PETSTORE).unwrap();
    let pets = endpoint(&document.endpoints, "/pets");
    let organized = document.organize(&[pets]).value;

    let mut config = Config::default();
    config.array_length = 2;
    config
        .faker_map
        .register("created_at", CustomProducer::new("() => '2024-01-01'", || Ok(json!("2024-01-01"))));

    let first = generate_mocks(&organized, &config);
    let second = generate_mocks(&organized, &config);
    let first = first.endpoints[0].responses[0].evaluation.value().unwrap().clone();
    let second = second.endpoints[0].responses[0].evaluation.value().unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 2);
    assert_eq!(first[0]["created_at"], json!("2024-01-01"));
}

#[test]
fn test_dynamic_source_output() {
    let document = OpenApiParser::parse(PETSTORE).unwrap();
    let stores = endpoint(&document.endpoints, "/api/v1/stores");
    let organized = document.organize(&[stores]).value;

    let mut config = Config::default();
    config.dynamic = true;
    let run = generate_mocks(&organized, &config);

    let source = run.endpoints[0].responses[0].source();
    assert!(source.starts_with("{'total': faker.number.int({ min: 1, max: 1000, multipleOf: 1 })"));
    assert!(source.contains(r#"'status': faker.helpers.arrayElement(["open","closed"])"#));
    assert!(source.contains("[faker.lorem.words()]: faker.datatype.boolean()"));
}

#[test]
fn test_compile_resolved_object() {
    let document = OpenApiParser::parse(PETSTORE).unwrap();
    let pets = endpoint(&document.endpoints, "/pets");
    let organized = document.organize(&[pets]).value;

    let config = Config::default();
    let context = config.context_for("/pets", HttpMethod::Get);
    let mut errors = mock_generator::CollectedErrors::new();
    let expression = MockCompiler::new(&context).compile_response(organized[0].responses[0].json(), &mut errors);

    let MockExpression::Repeat { item, .. } = expression else {
        panic!("expected a repeated item");
    };
    let MockExpression::Object(entries) = *item else {
        panic!("expected an object item");
    };

    let compiled: Vec<(String, MockExpression)> = entries
        .into_iter()
        .map(|entry| match entry.key {
            EntryKey::Fixed(key) => (key, entry.value),
            EntryKey::Generated(_) => unreachable!(),
        })
        .collect();

    assert!(matches!(compiled[0].1, MockExpression::Call(Capability::SeededId { .. })));
    assert_eq!(compiled[1].1, MockExpression::Call(Capability::FullName));
    assert_eq!(compiled[2].1, MockExpression::Call(Capability::DateTime));
    assert_eq!(compiled[4].1, MockExpression::Call(Capability::Words));
}
