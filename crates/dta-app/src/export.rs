//! JSON export of the data model.

use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::model::DataModel;

pub fn to_json_string(model: &DataModel) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(model)?)
}

pub fn write_json(model: &DataModel, path: &Path) -> AppResult<()> {
    let content = to_json_string(model)?;
    std::fs::write(path, content).map_err(|e| AppError::ExportFileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a model previously written by [`write_json`].
pub fn read_json(path: &Path) -> AppResult<DataModel> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_log::Experiment;
    use std::collections::BTreeMap;

    #[test]
    fn json_has_model_shape() {
        let model = DataModel::assemble(
            vec![Experiment {
                algorithm: "cch".to_string(),
                algorithm_base: "cch".to_string(),
                instance_index: 3,
                repetition: 1,
                ..Default::default()
            }],
            BTreeMap::new(),
        );
        let json = to_json_string(&model).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["algorithms"], serde_json::json!(["cch"]));
        assert_eq!(value["experiments"][0]["instance_index"], 3);
        assert!(value["instances"].as_object().unwrap().is_empty());
        // absent total duration stays distinguishable from zero
        assert!(value["experiments"][0]["total_duration"].is_null());
    }
}
