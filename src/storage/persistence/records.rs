//! Record-level edits on persisted tree contents, shared by the clients.

use crate::models::{
    Event, EventId, Media, MediaId, Person, PersonId, Relationship, RelationshipId, TreeData,
};
use crate::{Error, Result};

fn require_person(data: &TreeData, id: &PersonId) -> Result<()> {
    if data.people.iter().any(|p| p.id == *id) {
        Ok(())
    } else {
        Err(Error::not_found("person", id))
    }
}

pub fn create_person(data: &mut TreeData, person: &Person) -> Result<Person> {
    if data.people.iter().any(|p| p.id == person.id) {
        return Err(Error::Validation(format!("person {} already exists", person.id)));
    }
    data.people.push(person.clone());
    Ok(person.clone())
}

pub fn update_person(data: &mut TreeData, person: &Person) -> Result<Person> {
    let stored = data
        .people
        .iter_mut()
        .find(|p| p.id == person.id)
        .ok_or_else(|| Error::not_found("person", &person.id))?;
    *stored = person.clone();
    stored.updated_at = stored.updated_at.max(crate::current_timestamp());
    Ok(stored.clone())
}

pub fn delete_person(data: &mut TreeData, id: &PersonId) -> Result<()> {
    require_person(data, id)?;
    data.people.retain(|p| p.id != *id);
    data.relationships.retain(|r| !r.involves(id));
    data.events.retain(|e| e.data.person_id.as_ref() != Some(id));
    let removed: Vec<MediaId> = data
        .media
        .iter()
        .filter(|m| m.data.person_id.as_ref() == Some(id))
        .map(|m| m.id.clone())
        .collect();
    for media_id in &removed {
        detach_media(data, media_id);
    }
    Ok(())
}

pub fn create_relationship(data: &mut TreeData, rel: &Relationship) -> Result<Relationship> {
    require_person(data, &rel.person_a)?;
    require_person(data, &rel.person_b)?;
    if data.relationships.iter().any(|r| r.id == rel.id) {
        return Err(Error::Validation(format!("relationship {} already exists", rel.id)));
    }
    data.relationships.push(rel.clone());
    Ok(rel.clone())
}

pub fn delete_relationship(data: &mut TreeData, id: &RelationshipId) -> Result<()> {
    let before = data.relationships.len();
    data.relationships.retain(|r| r.id != *id);
    if data.relationships.len() == before {
        return Err(Error::not_found("relationship", id));
    }
    Ok(())
}

pub fn create_event(data: &mut TreeData, event: &Event) -> Result<Event> {
    if let Some(person_id) = &event.data.person_id {
        require_person(data, person_id)?;
    }
    if let Some(media_id) = &event.data.media_id {
        if !data.media.iter().any(|m| m.id == *media_id) {
            return Err(Error::not_found("media", media_id));
        }
    }
    data.events.push(event.clone());
    Ok(event.clone())
}

pub fn delete_event(data: &mut TreeData, id: &EventId) -> Result<()> {
    let before = data.events.len();
    data.events.retain(|e| e.id != *id);
    if data.events.len() == before {
        return Err(Error::not_found("event", id));
    }
    Ok(())
}

pub fn create_media(data: &mut TreeData, media: &Media) -> Result<Media> {
    if let Some(person_id) = &media.data.person_id {
        require_person(data, person_id)?;
    }
    data.media.push(media.clone());
    Ok(media.clone())
}

pub fn delete_media(data: &mut TreeData, id: &MediaId) -> Result<()> {
    if detach_media(data, id) {
        Ok(())
    } else {
        Err(Error::not_found("media", id))
    }
}

fn detach_media(data: &mut TreeData, id: &MediaId) -> bool {
    let before = data.media.len();
    data.media.retain(|m| m.id != *id);
    for event in &mut data.events {
        if event.data.media_id.as_ref() == Some(id) {
            event.data.media_id = None;
        }
    }
    data.media.len() != before
}
