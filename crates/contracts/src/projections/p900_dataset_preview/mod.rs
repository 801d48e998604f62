use serde::{Deserialize, Serialize};

/// Снимок первых строк комплектного синтетического датасета.
///
/// Только для отображения на странице; в путь данных ассистента датасет
/// попадает один раз, при развёртывании (фиксированный file id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Сколько всего строк в файле (не только в снимке)
    pub total_rows: usize,
}
