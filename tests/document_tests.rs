use jsonblock::document::split_lines;
use jsonblock::{
    Block, BlockParser, BlockStart, CloseAction, DocumentParser, DocumentView, ErrorContext,
    ErrorKind, Line, Node, ParseConfig, ParseError, UnterminatedPolicy,
};
use serde_json::json;

fn json_only() -> ParseConfig {
    ParseConfig { front_matter: false, ..ParseConfig::default() }
}

#[test]
fn json_blocks_are_extracted_between_text() {
    let source = "intro\n{\"a\": 1,\n \"b\": [1, 2]}\nmiddle\n  {\"c\": \"}\"} after\nend";
    let doc = DocumentParser::with_config(&json_only()).parse(source).unwrap();

    let blocks: Vec<&Block> = doc.blocks().collect();
    assert_eq!(blocks.len(), 2);

    assert_eq!(blocks[0].kind(), "json");
    assert_eq!(blocks[0].start_line(), 2);
    assert_eq!(blocks[0].lines().len(), 2);
    assert_eq!(blocks[0].value(), Some(&json!({"a": 1, "b": [1, 2]})));

    assert_eq!(blocks[1].start_line(), 5);
    assert_eq!(blocks[1].start_column(), 2);
    assert_eq!(blocks[1].content(), r#"{"c": "}"}"#);
    assert_eq!(blocks[1].value(), Some(&json!({"c": "}"})));

    assert_eq!(doc.text(), "intro\nmiddle\n after\nend");
    match &doc.nodes[4] {
        Node::Text { line, text } => {
            assert_eq!(*line, 5);
            assert_eq!(text, " after");
        }
        other => panic!("expected trailing text, got {other:?}"),
    }
}

#[test]
fn trailing_text_after_multi_line_block() {
    let doc = DocumentParser::with_config(&json_only())
        .parse("{\n\"a\": 1\n} and more")
        .unwrap();
    let block = doc.blocks().next().unwrap();
    assert_eq!(block.lines().len(), 3);
    assert_eq!(block.value(), Some(&json!({"a": 1})));
    assert_eq!(doc.text(), " and more");
}

#[test]
fn block_ids_follow_document_order() {
    let doc = DocumentParser::with_config(&json_only())
        .parse("{}\ntext\n{\"x\": 1}")
        .unwrap();
    let ids: Vec<usize> = doc.blocks().map(|block| block.id().0).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn leading_object_is_front_matter() {
    let source = "{\n  \"title\": \"T\"\n}\n# Heading\n{\"x\": 1}";
    let doc = DocumentParser::with_config(&ParseConfig::default()).parse(source).unwrap();

    let blocks: Vec<&Block> = doc.blocks().collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].kind(), "front-matter");
    assert_eq!(blocks[0].lines().len(), 3);
    assert_eq!(blocks[0].value(), Some(&json!({"title": "T"})));
    assert_eq!(blocks[1].kind(), "json");
    assert_eq!(blocks[1].start_line(), 5);
    assert_eq!(doc.text(), "# Heading");
}

#[test]
fn front_matter_drops_text_after_closing_brace() {
    let doc = DocumentParser::with_config(&ParseConfig::default())
        .parse("{\"a\": 1} dropped\nnext")
        .unwrap();
    assert_eq!(doc.blocks().next().map(Block::kind), Some("front-matter"));
    assert_eq!(doc.text(), "next");
}

#[test]
fn front_matter_can_be_disabled() {
    let doc = DocumentParser::with_config(&json_only()).parse("{\"a\": 1}\n").unwrap();
    assert_eq!(doc.blocks().next().map(Block::kind), Some("json"));
}

#[test]
fn unterminated_block_can_consume_to_end() {
    let config = ParseConfig { unterminated: UnterminatedPolicy::ConsumeToEnd, ..json_only() };
    let doc = DocumentParser::with_config(&config)
        .parse("text\n{\n\"a\": 1\nmore")
        .unwrap();

    let block = doc.blocks().next().unwrap();
    assert_eq!(block.lines().len(), 3);
    assert!(!block.is_complete());
    assert!(block.value().is_none());
    assert_eq!(doc.text(), "text");
}

#[test]
fn unclosed_front_matter_is_unterminated() {
    let err = DocumentParser::with_config(&ParseConfig::default())
        .parse("{\n\"a\": 1\nmore")
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnterminatedEmbeddedValue { opened_at: 1 }));
    assert_eq!(err.context(), &ErrorContext::Line { line: 1, column: 1 });
}

#[test]
fn unclosed_front_matter_can_consume_to_end() {
    let config = ParseConfig {
        unterminated: UnterminatedPolicy::ConsumeToEnd,
        ..ParseConfig::default()
    };
    let doc = DocumentParser::with_config(&config).parse("{\n\"a\": 1\nmore").unwrap();

    assert_eq!(doc.nodes.len(), 1);
    let block = doc.blocks().next().unwrap();
    assert_eq!(block.kind(), "front-matter");
    assert_eq!(block.lines().len(), 3);
    assert!(!block.is_complete());
    assert!(block.value().is_none());
}

#[test]
fn line_break_separates_tokens_in_json_blocks() {
    let err = DocumentParser::with_config(&json_only())
        .parse("{\"n\": 1\n2}")
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedEmbeddedValue(_)));
    assert!(err.context().is_block());
}

/// Swallows `%%` lines without leaving a node behind.
struct Comment;

impl BlockParser for Comment {
    fn kind(&self) -> &str {
        "comment"
    }

    fn try_open_block(
        &mut self,
        line: &Line<'_>,
        _view: &DocumentView<'_>,
    ) -> Result<Option<BlockStart>, ParseError> {
        Ok(line.rest().starts_with("%%").then(|| BlockStart::at(0).completed(None)))
    }

    fn close_block(&mut self, _block: &mut Block) -> Result<CloseAction, ParseError> {
        Ok(CloseAction::Discard)
    }
}

#[test]
fn discarded_blocks_leave_no_node() {
    let mut parser = DocumentParser::new();
    parser.register(Comment);
    let doc = parser.parse("a\n%% hidden\nb").unwrap();
    assert_eq!(doc.nodes.len(), 2);
    assert_eq!(doc.text(), "a\nb");
}

#[test]
fn host_without_plugins_keeps_text() {
    let doc = DocumentParser::new().parse("a\r\n{\"x\": 1}").unwrap();
    assert_eq!(doc.blocks().count(), 0);
    assert_eq!(doc.text(), "a\n{\"x\": 1}");
}

#[test]
fn document_serializes_with_node_tags() {
    let doc = DocumentParser::with_config(&json_only()).parse("hi\n{\"x\": 1}").unwrap();
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["nodes"][0]["type"], "text");
    assert_eq!(value["nodes"][1]["type"], "block");
    assert_eq!(value["nodes"][1]["reference"]["kind"], "json");
    assert_eq!(value["nodes"][1]["value"], json!({"x": 1}));
}

#[test]
fn split_lines_handles_all_terminators() {
    assert_eq!(split_lines("a\r\nb\rc\n"), vec![(0, "a"), (3, "b"), (5, "c")]);
    assert_eq!(split_lines("\n"), vec![(0, "")]);
    assert!(split_lines("").is_empty());
}
