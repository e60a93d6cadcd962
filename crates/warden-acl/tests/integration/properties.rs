//! Property tests: resolved abilities are exactly the union of the grants
//! on the assigned roles.

use std::collections::BTreeSet;

use proptest::prelude::*;
use warden_acl::{AccessWriter, MemoryAccessStore, RoleAbilityResolver};
use warden_core::{Ability, AbilityId, Principal, PrincipalId, Role, RoleId};

fn union_of(grants: &[Vec<u64>], assigned: &[bool]) -> BTreeSet<String> {
    grants
        .iter()
        .zip(assigned)
        .filter(|(_, on)| **on)
        .flat_map(|(ids, _)| ids.iter().map(|id| format!("ability-{id}")))
        .collect()
}

proptest! {
    #[test]
    fn prop_abilities_are_union_of_assigned_grants(
        grants in prop::collection::vec(prop::collection::vec(0u64..8, 0..5), 1..4),
        assigned in prop::collection::vec(any::<bool>(), 4),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let resolved = runtime.block_on(async {
            let store = std::sync::Arc::new(MemoryAccessStore::new());
            for id in 0..8 {
                store
                    .put_ability(Ability::new(AbilityId::new(id), format!("ability-{id}")))
                    .await
                    .unwrap();
            }
            let mut principal = Principal::new(PrincipalId::new(1), "P", "p@example.com");
            for (idx, ids) in grants.iter().enumerate() {
                let role_id = RoleId::new(idx as u64);
                let mut role = Role::new(role_id, format!("role-{idx}"), "Role");
                for id in ids {
                    role = role.with_ability(AbilityId::new(*id));
                }
                store.put_role(role).await.unwrap();
                if assigned[idx] {
                    principal = principal.with_role(role_id);
                }
            }
            store.put_principal(principal).await.unwrap();
            RoleAbilityResolver::new(store)
                .resolve_abilities(PrincipalId::new(1))
                .await
        });
        prop_assert_eq!(resolved, union_of(&grants, &assigned));
    }
}
