use crate::config::Settings;
use crate::game::*;
use log::*;

/// Link balancing for one room: source-side links push their contents to the
/// storage-side link once they have accumulated enough to be worth a send.
pub fn run_links(world: &mut World, settings: &Settings, room: RoomName) {
    let storage_pos = world
        .structures_in(room)
        .find(|s| s.kind == StructureKind::Storage && s.my)
        .map(|s| s.pos);

    let storage_pos = match storage_pos {
        Some(pos) => pos,
        None => return,
    };

    let links: Vec<_> = world
        .structures_in(room)
        .filter(|s| s.kind == StructureKind::Link && s.my)
        .map(|s| {
            (
                s.id,
                s.pos.in_range_to(storage_pos, 2),
                s.store.map(|store| store.energy()).unwrap_or(0),
                s.store.map(|store| store.free_capacity()).unwrap_or(0),
            )
        })
        .collect();

    let receiver = links
        .iter()
        .filter(|(_, downstream, _, free)| *downstream && *free > 0)
        .max_by_key(|(_, _, _, free)| *free)
        .map(|(id, _, _, _)| *id);

    let receiver = match receiver {
        Some(id) => id,
        None => return,
    };

    for (link, downstream, energy, _) in links {
        if downstream || energy < settings.link_send_threshold {
            continue;
        }

        let code = world.link_transfer(link, receiver);

        if code != ReturnCode::Ok {
            debug!("{}: link send from {} failed: {:?}", room, link, code);
        }
    }
}
