//! Typed schemas for the people and planets datasets.
use std::collections::HashMap;
use std::sync::Arc;

use polars::prelude::DataFrame;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use tracing::warn;

use crate::cells::{tag_line, CellRenderer, MUTED, TAG};
use crate::column::ColumnDef;
use crate::domain::RTVError;
use crate::records::{records_from_frame, Record};
use crate::resource::{fetch_resource_data, ResourceDef};
use crate::schema::{col, ColumnConfig, Field};
use crate::value::{Mixed, Value};

const MISSING_MARKERS: [&str; 3] = ["n/a", "none", "unknown"];

/// Splits a comma separated list, dropping placeholder entries.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !MISSING_MARKERS.contains(&s.to_ascii_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

fn text_of(record: &Record, key: &str) -> String {
    match record.get(key) {
        Value::Null => String::new(),
        Value::Text(s) => s,
        other => other.to_string(),
    }
}

fn mixed_of(record: &Record, key: &str) -> Mixed {
    match record.get(key) {
        Value::Number(n) => Mixed::Number(n),
        Value::Text(s) => Mixed::parse(&s),
        Value::Null => Mixed::Text(String::new()),
        other => Mixed::Text(other.to_string()),
    }
}

fn tags_of(record: &Record, key: &str) -> Vec<String> {
    match record.get(key) {
        Value::Tags(tags) => tags,
        Value::Text(s) => split_tags(&s),
        _ => Vec::new(),
    }
}

fn list_of(record: &Record, key: &str) -> Vec<String> {
    match record.get(key) {
        Value::Tags(items) => items,
        Value::Text(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn bold() -> Style {
    Style::new().add_modifier(Modifier::BOLD)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub height: Mixed,
    pub mass: Mixed,
    pub hair_color: Vec<String>,
    pub skin_color: Vec<String>,
    pub eye_color: Vec<String>,
    pub birth_year: String,
    pub gender: String,
    pub url: String,
}

impl Person {
    pub const NAME: Field<Person, String> = Field::new("name", |p, _| p.name.clone());
    pub const HEIGHT: Field<Person, Mixed> = Field::new("height", |p, _| p.height.clone());
    pub const MASS: Field<Person, Mixed> = Field::new("mass", |p, _| p.mass.clone());
    pub const HAIR_COLOR: Field<Person, Vec<String>> =
        Field::new("hair_color", |p, _| p.hair_color.clone());
    pub const SKIN_COLOR: Field<Person, Vec<String>> =
        Field::new("skin_color", |p, _| p.skin_color.clone());
    pub const EYE_COLOR: Field<Person, Vec<String>> =
        Field::new("eye_color", |p, _| p.eye_color.clone());
    pub const BIRTH_YEAR: Field<Person, String> =
        Field::new("birth_year", |p, _| p.birth_year.clone());
    pub const GENDER: Field<Person, String> = Field::new("gender", |p, _| p.gender.clone());

    pub fn from_record(record: &Record) -> Self {
        Self {
            name: text_of(record, "name"),
            height: mixed_of(record, "height"),
            mass: mixed_of(record, "mass"),
            hair_color: tags_of(record, "hair_color"),
            skin_color: tags_of(record, "skin_color"),
            eye_color: tags_of(record, "eye_color"),
            birth_year: text_of(record, "birth_year"),
            gender: text_of(record, "gender"),
            url: text_of(record, "url"),
        }
    }

    pub fn parse(df: DataFrame) -> Result<Vec<Person>, RTVError> {
        if df.column("name").is_err() {
            return Err(RTVError::ParseFailed("people need a \"name\" column".into()));
        }
        Ok(records_from_frame(df)?
            .iter()
            .map(Person::from_record)
            .collect())
    }

    /// Identity that survives reloads and re-sorts.
    pub fn row_key(&self) -> String {
        if self.url.is_empty() {
            self.name.clone()
        } else {
            self.url.clone()
        }
    }

    pub fn columns() -> Vec<ColumnDef<Person>> {
        vec![
            col(Self::NAME, ColumnConfig::text("Name").cell_style(bold())),
            col(Self::GENDER, ColumnConfig::text("Gender")),
            col(Self::BIRTH_YEAR, ColumnConfig::text("Born")),
            col(Self::HEIGHT, ColumnConfig::numeric("Height").unit(" cm")),
            col(Self::MASS, ColumnConfig::numeric("Mass").unit(" kg")),
            col(Self::HAIR_COLOR, ColumnConfig::tags("Hair")),
            col(Self::EYE_COLOR, ColumnConfig::tags("Eyes")),
            col(Self::SKIN_COLOR, ColumnConfig::tags("Skin")),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    pub name: String,
    pub rotation_period: Mixed,
    pub orbital_period: Mixed,
    pub diameter: Mixed,
    pub climate: Vec<String>,
    pub gravity: String,
    pub terrain: Vec<String>,
    pub surface_water: Mixed,
    pub population: Mixed,
    pub residents: Vec<String>,
    pub url: String,
}

impl Planet {
    pub const NAME: Field<Planet, String> = Field::new("name", |p, _| p.name.clone());
    pub const ROTATION_PERIOD: Field<Planet, Mixed> =
        Field::new("rotation_period", |p, _| p.rotation_period.clone());
    pub const ORBITAL_PERIOD: Field<Planet, Mixed> =
        Field::new("orbital_period", |p, _| p.orbital_period.clone());
    pub const DIAMETER: Field<Planet, Mixed> = Field::new("diameter", |p, _| p.diameter.clone());
    pub const CLIMATE: Field<Planet, Vec<String>> =
        Field::new("climate", |p, _| p.climate.clone());
    pub const GRAVITY: Field<Planet, String> = Field::new("gravity", |p, _| p.gravity.clone());
    pub const TERRAIN: Field<Planet, Vec<String>> =
        Field::new("terrain", |p, _| p.terrain.clone());
    pub const SURFACE_WATER: Field<Planet, Mixed> =
        Field::new("surface_water", |p, _| p.surface_water.clone());
    pub const POPULATION: Field<Planet, Mixed> =
        Field::new("population", |p, _| p.population.clone());
    pub const RESIDENTS: Field<Planet, Vec<String>> =
        Field::new("residents", |p, _| p.residents.clone());

    pub fn from_record(record: &Record) -> Self {
        Self {
            name: text_of(record, "name"),
            rotation_period: mixed_of(record, "rotation_period"),
            orbital_period: mixed_of(record, "orbital_period"),
            diameter: mixed_of(record, "diameter"),
            climate: tags_of(record, "climate"),
            gravity: text_of(record, "gravity"),
            terrain: tags_of(record, "terrain"),
            surface_water: mixed_of(record, "surface_water"),
            population: mixed_of(record, "population"),
            residents: list_of(record, "residents"),
            url: text_of(record, "url"),
        }
    }

    pub fn parse(df: DataFrame) -> Result<Vec<Planet>, RTVError> {
        if df.column("name").is_err() {
            return Err(RTVError::ParseFailed("planets need a \"name\" column".into()));
        }
        Ok(records_from_frame(df)?
            .iter()
            .map(Planet::from_record)
            .collect())
    }

    pub fn row_key(&self) -> String {
        if self.url.is_empty() {
            self.name.clone()
        } else {
            self.url.clone()
        }
    }

    /// The residents column resolves urls against `people` when given.
    pub fn columns(people: Option<Arc<Vec<Person>>>) -> Vec<ColumnDef<Planet>> {
        vec![
            col(Self::NAME, ColumnConfig::text("Name").cell_style(bold())),
            col(Self::CLIMATE, ColumnConfig::tags("Climate")),
            col(Self::TERRAIN, ColumnConfig::tags("Terrain")),
            col(Self::POPULATION, ColumnConfig::numeric("Population")),
            col(Self::DIAMETER, ColumnConfig::numeric("Diameter").unit(" km")),
            col(Self::GRAVITY, ColumnConfig::text("Gravity")),
            col(
                Self::ROTATION_PERIOD,
                ColumnConfig::numeric("Day").unit(" h"),
            ),
            col(
                Self::ORBITAL_PERIOD,
                ColumnConfig::numeric("Year").unit(" days"),
            ),
            col(
                Self::SURFACE_WATER,
                ColumnConfig::numeric("Water").unit("%"),
            ),
            col(
                Self::RESIDENTS,
                ColumnConfig::custom("Residents").render_with(residents_cell(people)),
            ),
        ]
    }
}

/// Loads the people used to resolve planet residents. A failed load is
/// logged and yields `None`, residents then collapse into `+N`.
pub fn load_people(url: &str) -> Option<Arc<Vec<Person>>> {
    match fetch_resource_data(&ResourceDef::new(url, Person::parse)) {
        Ok((_, people)) => Some(Arc::new(people)),
        Err(e) => {
            warn!("Loading people from {url} failed: {e}");
            None
        }
    }
}

/// Renders resident urls as name badges. Urls without a known person, or
/// all of them while people are not loaded, collapse into a muted `+N`.
pub fn residents_cell(people: Option<Arc<Vec<Person>>>) -> CellRenderer<Planet> {
    let names: Option<HashMap<String, String>> = people.map(|people| {
        people
            .iter()
            .map(|p| (p.url.clone(), p.name.clone()))
            .collect()
    });

    CellRenderer::custom(move |ctx| {
        let urls = ctx.value.as_tags().unwrap_or_default();
        let found: Vec<&str> = match &names {
            Some(names) => urls
                .iter()
                .filter_map(|url| names.get(url).map(String::as_str))
                .collect(),
            None => Vec::new(),
        };
        let missing = urls.len() - found.len();

        let mut line = tag_line(&found, ctx.style);
        if missing > 0 {
            if !found.is_empty() {
                line.spans.push(Span::raw(" "));
            }
            line.spans.push(Span::styled(
                format!(" +{missing} "),
                ctx.style.patch(TAG).patch(MUTED),
            ));
        }
        line
    })
}

/// Flattens the residents cell into plain text, used when copying rows.
pub fn residents_text(line: &Line) -> String {
    line.spans
        .iter()
        .map(|s| s.content.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::render_cell;
    use crate::column::SortEntry;
    use crate::resource::scan_frame;
    use crate::sort::sort_data;
    use crate::value::SortValue;
    use ratatui::style::Color;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    fn load<T>(name: &str, parse: fn(DataFrame) -> Result<Vec<T>, RTVError>) -> Vec<T> {
        parse(scan_frame(&fixture(name)).unwrap().collect().unwrap()).unwrap()
    }

    fn tokens(line: &Line) -> Vec<String> {
        line.spans
            .iter()
            .filter(|s| s.style.bg == Some(Color::Gray))
            .map(|s| s.content.trim().to_string())
            .collect()
    }

    fn planet(residents: &[&str]) -> Planet {
        Planet {
            name: "Tatooine".into(),
            rotation_period: Mixed::Number(23.0),
            orbital_period: Mixed::Number(304.0),
            diameter: Mixed::Number(10465.0),
            climate: vec!["arid".into()],
            gravity: "1 standard".into(),
            terrain: vec!["desert".into()],
            surface_water: Mixed::Number(1.0),
            population: Mixed::Number(200000.0),
            residents: residents.iter().map(|s| s.to_string()).collect(),
            url: String::new(),
        }
    }

    fn luke() -> Person {
        Person {
            name: "Luke Skywalker".into(),
            height: Mixed::Number(172.0),
            mass: Mixed::Number(77.0),
            hair_color: vec!["blond".into()],
            skin_color: vec!["fair".into()],
            eye_color: vec!["blue".into()],
            birth_year: "19BBY".into(),
            gender: "male".into(),
            url: "people/1".into(),
        }
    }

    fn residents_column(people: Option<Arc<Vec<Person>>>) -> ColumnDef<Planet> {
        Planet::columns(people)
            .into_iter()
            .find(|c| c.id == "residents")
            .unwrap()
    }

    #[test]
    fn splits_tags_and_drops_placeholders() {
        assert_eq!(split_tags("white, blue"), vec!["white", "blue"]);
        assert!(split_tags("n/a").is_empty());
        assert!(split_tags("None").is_empty());
        assert!(split_tags("unknown").is_empty());
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn parses_people_fixture() {
        let people = load("people.csv", Person::parse);
        assert_eq!(people[0].name, "Luke Skywalker");
        assert_eq!(people[0].height, Mixed::Number(172.0));
        assert_eq!(people[0].hair_color, vec!["blond"]);
        assert!(people[1].hair_color.is_empty());

        let jabba = people.iter().find(|p| p.name.starts_with("Jabba")).unwrap();
        assert_eq!(jabba.mass, Mixed::Number(1358.0));
        let arvel = people.iter().find(|p| p.name == "Arvel Crynyd").unwrap();
        assert_eq!(arvel.height, Mixed::Text("unknown".into()));
    }

    #[test]
    fn unknown_people_sort_last() {
        let people = load("people.csv", Person::parse);
        let columns = Person::columns();
        let sorted = sort_data(&people, &columns, &[SortEntry::desc("height")]);
        assert_eq!(sorted[0].name, "Darth Vader");
        assert_eq!(sorted.last().unwrap().name, "Arvel Crynyd");

        let height = columns.iter().find(|c| c.id == "height").unwrap();
        assert_eq!(height.sort_value(sorted[0]), Some(SortValue::Number(202.0)));
    }

    #[test]
    fn person_columns_are_configured() {
        let columns = Person::columns();
        let by_id = |id: &str| columns.iter().find(|c| c.id == id).unwrap();
        assert!(by_id("name").style.cell.add_modifier.contains(Modifier::BOLD));
        assert_eq!(by_id("mass").props.numeric_unit.as_deref(), Some(" kg"));
        assert!(!by_id("hair_color").can_sort());

        let line = render_cell(by_id("height"), &luke());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "172 cm");
    }

    #[test]
    fn parses_planets_fixture() {
        let planets = load("planets.csv", Planet::parse);
        let tatooine = &planets[0];
        assert_eq!(tatooine.residents.len(), 3);
        assert_eq!(tatooine.terrain, vec!["desert"]);
        let alderaan = &planets[1];
        assert_eq!(alderaan.terrain, vec!["grasslands", "mountains"]);
        assert_eq!(alderaan.population, Mixed::Number(2_000_000_000.0));
        assert!(planets[2].residents.is_empty());
    }

    #[test]
    fn residents_without_urls_render_nothing() {
        let column = residents_column(Some(Arc::new(vec![luke()])));
        assert!(render_cell(&column, &planet(&[])).spans.is_empty());
    }

    #[test]
    fn residents_collapse_while_people_are_missing() {
        let column = residents_column(None);
        let line = render_cell(&column, &planet(&["people/1", "people/2"]));
        assert_eq!(tokens(&line), vec!["+2"]);
        assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
    }

    #[test]
    fn residents_resolve_known_people() {
        let column = residents_column(Some(Arc::new(vec![luke()])));
        let line = render_cell(&column, &planet(&["people/1", "people/2", "people/3"]));
        assert_eq!(tokens(&line), vec!["Luke Skywalker", "+2"]);
        assert_eq!(residents_text(&line), "Luke Skywalker, +2");

        let line = render_cell(&column, &planet(&["people/1"]));
        assert_eq!(tokens(&line), vec!["Luke Skywalker"]);
    }

    #[test]
    fn unreadable_people_fall_back_to_counts() {
        assert!(load_people(&fixture("missing_people.csv")).is_none());
        let tatooine = &load("planets.csv", Planet::parse)[0];

        let column = residents_column(load_people(&fixture("missing_people.csv")));
        assert_eq!(tokens(&render_cell(&column, tatooine)), vec!["+3"]);

        let column = residents_column(load_people(&fixture("people.csv")));
        let line = render_cell(&column, tatooine);
        assert_eq!(tokens(&line), vec!["Luke Skywalker", "C-3PO", "Darth Vader"]);
    }

    #[test]
    fn residents_are_not_sortable() {
        assert!(!residents_column(None).can_sort());
    }
}
