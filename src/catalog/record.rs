use serde::{Deserialize, Serialize};

/// Column order of the persisted table.
pub const BASE_COLUMNS: [&str; 10] = [
    "Id",
    "Name",
    "Beer Full Name",
    "Style",
    "Brewery",
    "Description",
    "ABV",
    "Min IBU",
    "Max IBU",
    "Rating",
];

pub const USER_COLUMNS: [&str; 2] = ["User Rating", "User Comment"];

/// One catalog row. Base fields keep the raw cell text so that rows with
/// unparsable numbers survive a rewrite untouched; numbers are coerced on
/// demand.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Beer Full Name")]
    pub full_name: String,
    #[serde(rename = "Style")]
    pub style: String,
    #[serde(rename = "Brewery")]
    pub brewery: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "ABV")]
    pub abv: String,
    #[serde(rename = "Min IBU")]
    pub ibu_min: String,
    #[serde(rename = "Max IBU")]
    pub ibu_max: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "User Rating", default)]
    pub user_rating: Option<String>,
    #[serde(rename = "User Comment", default)]
    pub user_comment: Option<String>,
    /// Cells of columns the catalog does not interpret, aligned with
    /// `Catalog::extra_columns`.
    #[serde(skip)]
    pub extras: Vec<String>,
}

/// Whether `column` is one the catalog reads or writes itself.
pub fn is_known_column(column: &str) -> bool {
    BASE_COLUMNS.contains(&column) || USER_COLUMNS.contains(&column)
}

fn numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl CatalogRecord {
    pub fn abv_value(&self) -> Option<f64> {
        numeric(&self.abv)
    }

    pub fn ibu_range(&self) -> Option<(f64, f64)> {
        Some((numeric(&self.ibu_min)?, numeric(&self.ibu_max)?))
    }

    pub fn rating_value(&self) -> Option<f64> {
        numeric(&self.rating)
    }

    /// Cell text for `column`; `extra_columns` names the columns behind
    /// `extras`. Unknown or absent cells are empty.
    pub fn cell<'a>(&'a self, column: &str, extra_columns: &[&str]) -> &'a str {
        match column {
            "Id" => &self.id,
            "Name" => &self.name,
            "Beer Full Name" => &self.full_name,
            "Style" => &self.style,
            "Brewery" => &self.brewery,
            "Description" => &self.description,
            "ABV" => &self.abv,
            "Min IBU" => &self.ibu_min,
            "Max IBU" => &self.ibu_max,
            "Rating" => &self.rating,
            "User Rating" => self.user_rating.as_deref().unwrap_or(""),
            "User Comment" => self.user_comment.as_deref().unwrap_or(""),
            other => extra_columns
                .iter()
                .position(|c| *c == other)
                .and_then(|i| self.extras.get(i))
                .map(String::as_str)
                .unwrap_or(""),
        }
    }

    pub fn view(&self) -> BeerView {
        BeerView {
            id: self
                .id
                .trim()
                .parse::<i64>()
                .map(serde_json::Value::from)
                .unwrap_or_else(|_| serde_json::Value::from(self.id.clone())),
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            style: self.style.clone(),
            brewery: self.brewery.clone(),
            description: self.description.clone(),
            abv: self.abv_value(),
            min_ibu: numeric(&self.ibu_min),
            max_ibu: numeric(&self.ibu_max),
            rating: self.rating_value(),
        }
    }
}

/// Fixed projection returned by queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeerView {
    pub id: serde_json::Value,
    pub name: String,
    pub full_name: String,
    pub style: String,
    pub brewery: String,
    pub description: String,
    pub abv: Option<f64>,
    pub min_ibu: Option<f64>,
    pub max_ibu: Option<f64>,
    pub rating: Option<f64>,
}
