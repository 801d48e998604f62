use crate::shared::assistant::types::{Annotation, MessageContent, ThreadMessage};
use std::collections::HashSet;

/// Найти файлы, созданные ассистентом, в полной истории треда.
///
/// Сканируются оба вида ролей: структурные ссылки на файлы живут в
/// аннотациях текста (sandbox-пути, цитаты), в image_file-блоках и во
/// вложениях. Файлы, загруженные пользователем при создании треда,
/// исключаются по ID. Порядок — первое появление при хронологическом
/// проходе; функция идемпотентна.
pub fn find_produced_files(messages: &[ThreadMessage], uploaded: &[String]) -> Vec<String> {
    let uploaded: HashSet<&str> = uploaded.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut produced = Vec::new();

    let push = |file_id: &str, seen: &mut HashSet<String>, produced: &mut Vec<String>| {
        if file_id.is_empty() || uploaded.contains(file_id) {
            return;
        }
        if seen.insert(file_id.to_string()) {
            produced.push(file_id.to_string());
        }
    };

    for message in messages {
        for block in &message.content {
            match block {
                MessageContent::Text { text } => {
                    for annotation in &text.annotations {
                        match annotation {
                            Annotation::FilePath { file_path } => {
                                push(&file_path.file_id, &mut seen, &mut produced)
                            }
                            Annotation::FileCitation { file_citation } => {
                                push(&file_citation.file_id, &mut seen, &mut produced)
                            }
                            Annotation::Other => {}
                        }
                    }
                }
                MessageContent::ImageFile { image_file } => {
                    push(&image_file.file_id, &mut seen, &mut produced)
                }
                MessageContent::Other => {}
            }
        }
        for attachment in &message.attachments {
            push(&attachment.file_id, &mut seen, &mut produced);
        }
    }

    produced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::assistant::types::{Attachment, FileRef, MessageText};

    fn text_message(id: &str, role: &str, annotations: Vec<Annotation>) -> ThreadMessage {
        ThreadMessage {
            id: id.to_string(),
            role: role.to_string(),
            content: vec![MessageContent::Text {
                text: MessageText {
                    value: "...".into(),
                    annotations,
                },
            }],
            attachments: vec![],
        }
    }

    fn file_path(file_id: &str) -> Annotation {
        Annotation::FilePath {
            file_path: FileRef {
                file_id: file_id.into(),
            },
        }
    }

    #[test]
    fn test_empty_history_yields_empty() {
        assert!(find_produced_files(&[], &["file-up".into()]).is_empty());
    }

    #[test]
    fn test_first_seen_order_and_dedup() {
        let messages = vec![
            text_message("m1", "assistant", vec![file_path("file-a"), file_path("file-b")]),
            text_message("m2", "assistant", vec![file_path("file-a"), file_path("file-c")]),
        ];
        assert_eq!(
            find_produced_files(&messages, &[]),
            vec!["file-a", "file-b", "file-c"]
        );
    }

    #[test]
    fn test_uploaded_files_are_excluded() {
        let messages = vec![text_message(
            "m1",
            "assistant",
            vec![
                Annotation::FileCitation {
                    file_citation: FileRef {
                        file_id: "file-up".into(),
                    },
                },
                file_path("file-out"),
            ],
        )];
        assert_eq!(
            find_produced_files(&messages, &["file-up".into()]),
            vec!["file-out"]
        );
    }

    #[test]
    fn test_image_blocks_and_attachments_are_scanned() {
        let messages = vec![ThreadMessage {
            id: "m1".into(),
            role: "assistant".into(),
            content: vec![MessageContent::ImageFile {
                image_file: FileRef {
                    file_id: "file-img".into(),
                },
            }],
            attachments: vec![Attachment {
                file_id: "file-att".into(),
            }],
        }];
        assert_eq!(
            find_produced_files(&messages, &[]),
            vec!["file-img", "file-att"]
        );
    }

    #[test]
    fn test_idempotent_on_same_history() {
        let messages = vec![text_message("m1", "assistant", vec![file_path("file-a")])];
        let first = find_produced_files(&messages, &[]);
        let second = find_produced_files(&messages, &[]);
        assert_eq!(first, second);
    }
}
