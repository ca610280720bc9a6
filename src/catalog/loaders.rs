use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::{LoadError, Loader};
use crate::config::NotionSource;
use crate::services::notion::{NotionClient, Page};

/// Piece codes offered in the material-capture form. Only open work within a
/// year of today, not yet linked to a capture, is listed.
pub struct LogisticsItemsLoader {
    notion: NotionClient,
    source: NotionSource,
}

impl LogisticsItemsLoader {
    pub fn new(notion: NotionClient, source: NotionSource) -> Self {
        Self { notion, source }
    }

    fn query_body() -> Value {
        let today = Utc::now();
        let one_year_ago = (today - Duration::days(365)).format("%Y-%m-%d").to_string();
        let one_year_ahead = (today + Duration::days(365)).format("%Y-%m-%d").to_string();

        json!({
            "filter": {
                "and": [
                    { "property": "FECHA DE CREACION", "date": { "on_or_after": one_year_ago } },
                    { "property": "FECHA DE CREACION", "date": { "on_or_before": one_year_ahead } },
                    { "property": "06-ESTATUS GENERAL", "select": { "does_not_equal": "D7-ENTREGADA" } },
                    { "property": "06-ESTATUS GENERAL", "select": { "does_not_equal": "D1-TERMINADA" } },
                    { "property": "06-ESTATUS GENERAL", "select": { "does_not_equal": "D8-CANCELADA" } },
                    { "property": "CAPTURA DE MATERIAL", "relation": { "is_empty": true } }
                ]
            }
        })
    }
}

#[async_trait]
impl Loader for LogisticsItemsLoader {
    type Item = String;

    async fn load(&self) -> Result<Vec<String>, LoadError> {
        let pages = self.notion.query_all(&self.source, Self::query_body()).await?;
        let mut items: Vec<String> = pages
            .iter()
            .filter_map(|page| page.title_text("01-CODIGO PIEZA"))
            .map(str::to_string)
            .collect();
        items.sort();
        Ok(items)
    }
}

/// One row of the production planning board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningRecord {
    pub id: String,
    pub n: String,
    pub partida: String,
    pub nombre_pieza: String,
    pub partida_id: String,
    pub imagen_url: String,
    pub fecha_creacion: Option<String>,
    pub fecha_planeada: Option<String>,
    pub fecha_planeada_fin: Option<String>,
    pub maquina: String,
    pub operador: String,
    pub area: String,
}

impl PlanningRecord {
    /// Rows without a title are planner noise and are skipped.
    pub fn from_page(page: &Page) -> Option<Self> {
        let n = page.title_text("N")?.to_string();

        let nombre_pieza = page
            .rollup_title_text("NOMBRE PIEZA")
            .unwrap_or(&n)
            .to_string();
        // The 4Make formula carries the 85-... piece code when present.
        let partida = page
            .formula_string("4Make")
            .map(str::to_string)
            .unwrap_or_else(|| nombre_pieza.clone());

        let (fecha_planeada, fecha_planeada_fin) = page.date_range("FECHA PLANEADA");

        Some(Self {
            id: page.id.clone(),
            partida,
            nombre_pieza,
            partida_id: page.relation_first_id("PARTIDA").unwrap_or("").to_string(),
            imagen_url: page.first_file_url("A MOSTRAR").unwrap_or("").to_string(),
            fecha_creacion: page.date_start("FECHA DE CREACION"),
            fecha_planeada,
            fecha_planeada_fin,
            maquina: page.select_name("MAQUINA").unwrap_or("").to_string(),
            operador: page.select_name("OPERADOR").unwrap_or("").to_string(),
            area: page.formula_string("AREA").unwrap_or("").to_string(),
            n,
        })
    }
}

/// Planning rows from three days back onward, oldest first.
pub struct PlanningLoader {
    notion: NotionClient,
    source: NotionSource,
}

impl PlanningLoader {
    pub fn new(notion: NotionClient, source: NotionSource) -> Self {
        Self { notion, source }
    }

    fn query_body() -> Value {
        let cutoff = (Utc::now() - Duration::days(3)).to_rfc3339();
        json!({
            "filter": {
                "property": "FECHA PLANEADA",
                "date": { "on_or_after": cutoff }
            },
            "sorts": [
                { "property": "FECHA DE CREACION", "direction": "ascending" }
            ]
        })
    }
}

#[async_trait]
impl Loader for PlanningLoader {
    type Item = PlanningRecord;

    async fn load(&self) -> Result<Vec<PlanningRecord>, LoadError> {
        let pages = self.notion.query_all(&self.source, Self::query_body()).await?;
        Ok(pages.iter().filter_map(PlanningRecord::from_page).collect())
    }
}

/// Plain name list from a database's title column, for the accessory and
/// client dropdowns.
pub struct TitleCatalogLoader {
    notion: NotionClient,
    source: NotionSource,
}

impl TitleCatalogLoader {
    pub fn new(notion: NotionClient, source: NotionSource) -> Self {
        Self { notion, source }
    }
}

#[async_trait]
impl Loader for TitleCatalogLoader {
    type Item = String;

    async fn load(&self) -> Result<Vec<String>, LoadError> {
        let pages = self.notion.query_all(&self.source, json!({})).await?;
        let mut items: Vec<String> = pages
            .iter()
            .filter_map(|page| page.first_title_text())
            .map(str::to_string)
            .collect();
        items.sort();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planning_page(overrides: Value) -> Page {
        let mut base = json!({
            "id": "page-7",
            "properties": {
                "N": { "type": "title", "title": [{ "plain_text": "N-100" }] },
                "FECHA DE CREACION": { "type": "date", "date": { "start": "2025-04-01" } },
                "FECHA PLANEADA": {
                    "type": "date",
                    "date": { "start": "2025-04-10", "end": "2025-04-12" }
                },
                "MAQUINA": { "type": "select", "select": { "name": "Laser" } },
                "OPERADOR": { "type": "select", "select": { "name": "jm" } },
                "AREA": { "type": "formula", "formula": { "type": "string", "string": "Corte" } },
                "PARTIDA": { "type": "relation", "relation": [{ "id": "rel-1" }] },
                "4Make": { "type": "formula", "formula": { "type": "string", "string": "85-001" } },
                "NOMBRE PIEZA": {
                    "type": "rollup",
                    "rollup": {
                        "type": "array",
                        "array": [{ "type": "title", "title": [{ "plain_text": "Placa" }] }]
                    }
                },
                "A MOSTRAR": {
                    "type": "files",
                    "files": [{ "type": "file", "file": { "url": "https://files.example/p.png" } }]
                }
            }
        });
        if let (Some(props), Some(extra)) = (
            base["properties"].as_object_mut(),
            overrides.as_object(),
        ) {
            for (k, v) in extra {
                props.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn planning_record_extracts_every_field() {
        let record = PlanningRecord::from_page(&planning_page(json!({}))).unwrap();
        assert_eq!(record.id, "page-7");
        assert_eq!(record.n, "N-100");
        assert_eq!(record.partida, "85-001");
        assert_eq!(record.nombre_pieza, "Placa");
        assert_eq!(record.partida_id, "rel-1");
        assert_eq!(record.imagen_url, "https://files.example/p.png");
        assert_eq!(record.fecha_creacion.as_deref(), Some("2025-04-01"));
        assert_eq!(record.fecha_planeada.as_deref(), Some("2025-04-10"));
        assert_eq!(record.fecha_planeada_fin.as_deref(), Some("2025-04-12"));
        assert_eq!(record.maquina, "Laser");
        assert_eq!(record.operador, "jm");
        assert_eq!(record.area, "Corte");
    }

    #[test]
    fn partida_falls_back_to_rollup_then_title() {
        // No 4Make code: fall back to the rollup name
        let no_code = planning_page(json!({
            "4Make": { "type": "formula", "formula": { "type": "string", "string": null } }
        }));
        let record = PlanningRecord::from_page(&no_code).unwrap();
        assert_eq!(record.partida, "Placa");

        // Neither code nor rollup: fall back to the title
        let bare = planning_page(json!({
            "4Make": { "type": "formula", "formula": { "type": "string", "string": null } },
            "NOMBRE PIEZA": { "type": "rollup", "rollup": { "type": "array", "array": [] } }
        }));
        let record = PlanningRecord::from_page(&bare).unwrap();
        assert_eq!(record.partida, "N-100");
        assert_eq!(record.nombre_pieza, "N-100");
    }

    #[test]
    fn pages_without_title_are_skipped() {
        let untitled = planning_page(json!({
            "N": { "type": "title", "title": [] }
        }));
        assert!(PlanningRecord::from_page(&untitled).is_none());
    }

    #[test]
    fn logistics_query_excludes_closed_work() {
        let body = LogisticsItemsLoader::query_body();
        let clauses = body["filter"]["and"].as_array().unwrap();
        assert_eq!(clauses.len(), 6);
        let excluded: Vec<&str> = clauses
            .iter()
            .filter_map(|c| c["select"]["does_not_equal"].as_str())
            .collect();
        assert_eq!(excluded, vec!["D7-ENTREGADA", "D1-TERMINADA", "D8-CANCELADA"]);
        assert_eq!(
            clauses[5]["relation"]["is_empty"],
            Value::Bool(true)
        );
    }

    #[test]
    fn planning_query_sorts_by_creation_date() {
        let body = PlanningLoader::query_body();
        assert_eq!(body["filter"]["property"], "FECHA PLANEADA");
        assert_eq!(body["sorts"][0]["direction"], "ascending");
    }
}
