use serde::{Deserialize, Serialize};

/// Метаданные файла, созданного ассистентом во время выполнения.
///
/// Отличается от загруженных пользователем файлов источником: сюда попадают
/// только файлы с происхождением "assistant output".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactMeta {
    /// Непрозрачный ID файла в удалённом сервисе
    pub file_id: String,
    /// Человекочитаемое имя; при отсутствии метаданных — сам ID
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactListResponse {
    pub items: Vec<ArtifactMeta>,
    /// ID файлов, которые не удалось разрешить (частичный отказ не
    /// прерывает остальных)
    pub failed: Vec<String>,
}
