use mods_types::ObjSchema;
use std::collections::HashMap;

/// Keep the highest `version_index` per `object_id`.
///
/// Groups stay in first-seen order; on equal indexes the later record wins.
pub fn latest_versions(objs: Vec<ObjSchema>) -> Vec<ObjSchema> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut latest: Vec<ObjSchema> = Vec::new();

    for obj in objs {
        match positions.get(&obj.object_id) {
            Some(&pos) => {
                if latest[pos].version_index <= obj.version_index {
                    latest[pos] = obj;
                }
            }
            None => {
                positions.insert(obj.object_id.clone(), latest.len());
                latest.push(obj);
            }
        }
    }
    latest
}
