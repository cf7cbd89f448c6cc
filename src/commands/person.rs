//! Person, relationship, event and media command handlers.

use super::{EventAction, MediaAction, PersonAction, open_session};
use anyhow::Context;
use famgraph::config::FamgraphConfig;
use famgraph::models::{
    EventData, EventId, MediaData, MediaId, MediaType, Person, PersonData, PersonId,
    RelationshipId, RelationshipType,
};

/// Executes a person command.
pub async fn cmd_person(
    config: &FamgraphConfig,
    tree: Option<&str>,
    action: PersonAction,
) -> anyhow::Result<()> {
    let session = open_session(config, tree).await?;

    match action {
        PersonAction::Add {
            first_name,
            last_name,
            fields,
        } => {
            let data = fields.apply(PersonData::named(first_name, last_name))?;
            let id = session.add_person(data).await?;
            println!("Added person {id}");
        },
        PersonAction::Update {
            id,
            first_name,
            last_name,
            fields,
        } => {
            let id = PersonId::new(id);
            let current = session
                .snapshot()?
                .person(&id)
                .map(|p| p.data.clone())
                .with_context(|| format!("person {id} not found"))?;
            let mut data = fields.apply(current)?;
            if let Some(first_name) = first_name {
                data.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                data.last_name = last_name;
            }
            session.update_person(&id, data).await?;
            println!("Updated person {id}");
        },
        PersonAction::Remove { id } => {
            let report = session.remove_person(&PersonId::new(id.as_str())).await?;
            println!("Removed person {id}");
            println!("  Relationships removed: {}", report.relationships.len());
            println!("  Events removed:        {}", report.events.len());
            println!("  Media removed:         {}", report.media.len());
        },
        PersonAction::Show { id, format } => {
            let id = PersonId::new(id);
            let person = session
                .snapshot()?
                .person(&id)
                .cloned()
                .with_context(|| format!("person {id} not found"))?;
            let family = session.query(|resolver| Family {
                parents: names(resolver.parents(&id)),
                spouses: names(resolver.spouses(&id)),
                children: names(resolver.children(&id)),
                siblings: names(resolver.siblings(&id)),
            })?;

            match format.as_str() {
                "json" => print_person_json(&person, &family)?,
                _ => print_person_table(&person, &family),
            }
        },
    }

    Ok(())
}

/// Executes the relate command.
pub async fn cmd_relate(
    config: &FamgraphConfig,
    tree: Option<&str>,
    person_a: &str,
    person_b: &str,
    relationship_type: &str,
) -> anyhow::Result<()> {
    let relationship_type = RelationshipType::parse(relationship_type).with_context(|| {
        format!("unknown relationship type '{relationship_type}' (expected parent-child or spouse)")
    })?;
    let session = open_session(config, tree).await?;

    let id = session
        .add_relationship(
            &PersonId::new(person_a),
            &PersonId::new(person_b),
            relationship_type,
        )
        .await?;
    println!("Added {relationship_type} relationship {id}");
    Ok(())
}

/// Executes the unrelate command.
pub async fn cmd_unrelate(
    config: &FamgraphConfig,
    tree: Option<&str>,
    id: &str,
) -> anyhow::Result<()> {
    let session = open_session(config, tree).await?;
    session.remove_relationship(&RelationshipId::new(id)).await?;
    println!("Removed relationship {id}");
    Ok(())
}

/// Executes an event command.
pub async fn cmd_event(
    config: &FamgraphConfig,
    tree: Option<&str>,
    action: EventAction,
) -> anyhow::Result<()> {
    let session = open_session(config, tree).await?;

    match action {
        EventAction::Add {
            title,
            event_type,
            person,
            date,
            description,
            media,
        } => {
            let mut data = EventData::new(title, event_type);
            if let Some(person) = person {
                data = data.for_person(PersonId::new(person));
            }
            if let Some(date) = date {
                data = data.on(date);
            }
            if let Some(description) = description {
                data = data.with_description(description);
            }
            if let Some(media) = media {
                data = data.with_media(MediaId::new(media));
            }
            let id = session.add_event(data).await?;
            println!("Added event {id}");
        },
        EventAction::Remove { id } => {
            session.remove_event(&EventId::new(id.as_str())).await?;
            println!("Removed event {id}");
        },
    }

    Ok(())
}

/// Executes a media command.
pub async fn cmd_media(
    config: &FamgraphConfig,
    tree: Option<&str>,
    action: MediaAction,
) -> anyhow::Result<()> {
    match action {
        MediaAction::Add {
            url,
            media_type,
            person,
            tags,
        } => {
            let media_type = MediaType::parse(&media_type).with_context(|| {
                format!("unknown media type '{media_type}' (expected image, video, audio, or document)")
            })?;
            let mut data = MediaData::new(url, media_type);
            if let Some(person) = person {
                data = data.for_person(PersonId::new(person));
            }
            for tag in tags {
                data = data.with_tag(tag);
            }

            let session = open_session(config, tree).await?;
            let id = session.add_media(data).await?;
            println!("Added media {id}");
        },
        MediaAction::Remove { id } => {
            let session = open_session(config, tree).await?;
            session.remove_media(&MediaId::new(id.as_str())).await?;
            println!("Removed media {id}");
        },
    }

    Ok(())
}

/// Immediate family of a person, as `(id, display name)` pairs.
struct Family {
    parents: Vec<(String, String)>,
    spouses: Vec<(String, String)>,
    children: Vec<(String, String)>,
    siblings: Vec<(String, String)>,
}

fn names(people: Vec<&Person>) -> Vec<(String, String)> {
    people
        .into_iter()
        .map(|p| (p.id.to_string(), p.display_name()))
        .collect()
}

fn print_person_table(person: &Person, family: &Family) {
    let data = &person.data;
    let name = person.display_name();

    println!("Person: {name}");
    println!("========{}", "=".repeat(name.len()));
    println!();
    println!("ID:          {}", person.id);
    println!("Gender:      {}", data.gender);
    if let Some(maiden) = &data.maiden_name {
        println!("Maiden name: {maiden}");
    }
    println!(
        "Born:        {}",
        date_place(data.birth_date.as_deref(), data.birth_place.as_deref())
    );
    if data.is_living {
        println!("Living:      yes");
    } else {
        println!(
            "Died:        {}",
            date_place(data.death_date.as_deref(), data.death_place.as_deref())
        );
    }
    if let Some(bio) = &data.biography {
        println!();
        println!("{bio}");
    }

    for (label, members) in [
        ("Parents", &family.parents),
        ("Spouses", &family.spouses),
        ("Children", &family.children),
        ("Siblings", &family.siblings),
    ] {
        if members.is_empty() {
            continue;
        }
        println!();
        println!("{label}:");
        for (id, name) in members {
            println!("  {name:<30} {id}");
        }
    }
}

fn print_person_json(person: &Person, family: &Family) -> anyhow::Result<()> {
    let people = |members: &[(String, String)]| {
        members
            .iter()
            .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
            .collect::<Vec<_>>()
    };
    let output = serde_json::json!({
        "person": person,
        "parents": people(&family.parents),
        "spouses": people(&family.spouses),
        "children": people(&family.children),
        "siblings": people(&family.siblings),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn date_place(date: Option<&str>, place: Option<&str>) -> String {
    match (date, place) {
        (Some(date), Some(place)) => format!("{date}, {place}"),
        (Some(value), None) | (None, Some(value)) => value.to_string(),
        (None, None) => "(unknown)".to_string(),
    }
}
