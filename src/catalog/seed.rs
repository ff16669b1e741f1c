//! Fixed facility and service reference data
//!
//! Seeded once into an empty store, then treated as immutable reference
//! data. Prices are in CFA francs.

use crate::store::types::{Facility, GeoPoint, Service};
use std::collections::BTreeMap;

fn hours(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(day, h)| (day.to_string(), h.to_string()))
        .collect()
}

fn weekdays(week: &str, friday: &str, saturday: &str, sunday: &str) -> BTreeMap<String, String> {
    hours(&[
        ("monday", week),
        ("tuesday", week),
        ("wednesday", week),
        ("thursday", week),
        ("friday", friday),
        ("saturday", saturday),
        ("sunday", sunday),
    ])
}

fn always_open() -> BTreeMap<String, String> {
    weekdays("24/7", "24/7", "24/7", "24/7")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// The default facility catalog
pub fn default_facilities() -> Vec<Facility> {
    vec![
        Facility {
            id: 1,
            name: "Hôpital Principal de Dakar".to_string(),
            address: "Avenue Nelson Mandela, Dakar".to_string(),
            phone: "+221 33 839 50 50".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Urgences",
                "Radiologie",
                "Laboratoire",
            ]),
            description:
                "Hôpital public principal de Dakar offrant une large gamme de services médicaux."
                    .to_string(),
            location: GeoPoint {
                lat: 14.6928,
                lng: -17.4467,
            },
            waiting_time: 45,
            rating: 4.2,
            opening_hours: weekdays("08:00 - 18:00", "08:00 - 17:00", "09:00 - 13:00", "Urgences uniquement"),
            price: 5000,
            capacity: "500 lits".to_string(),
        },
        Facility {
            id: 2,
            name: "Centre Hospitalier Universitaire de Fann".to_string(),
            address: "Route des Almadies, Dakar".to_string(),
            phone: "+221 33 869 10 10".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Pédiatrie",
                "Cardiologie",
                "Ophtalmologie",
                "Dermatologie",
            ]),
            description:
                "Centre hospitalier universitaire spécialisé dans la recherche et les soins avancés."
                    .to_string(),
            location: GeoPoint {
                lat: 14.7167,
                lng: -17.4667,
            },
            waiting_time: 60,
            rating: 4.5,
            opening_hours: weekdays("07:30 - 19:00", "07:30 - 18:00", "08:00 - 14:00", "Urgences uniquement"),
            price: 7000,
            capacity: "350 lits".to_string(),
        },
        Facility {
            id: 3,
            name: "Hôpital Aristide Le Dantec".to_string(),
            address: "Avenue Pasteur, Dakar".to_string(),
            phone: "+221 33 822 24 24".to_string(),
            services: strings(&[
                "Urgences",
                "Chirurgie",
                "Maternité",
                "Pharmacie",
                "Consultation Générale",
            ]),
            description: "Hôpital de référence pour la chirurgie et la maternité à Dakar."
                .to_string(),
            location: GeoPoint {
                lat: 14.6769,
                lng: -17.4456,
            },
            waiting_time: 30,
            rating: 4.0,
            opening_hours: always_open(),
            price: 10000,
            capacity: "400 lits".to_string(),
        },
        Facility {
            id: 4,
            name: "Centre de Santé de Grand Yoff".to_string(),
            address: "Grand Yoff, Dakar".to_string(),
            phone: "+221 33 820 20 20".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Vaccination",
                "Planning Familial",
                "Pédiatrie",
            ]),
            description:
                "Centre de santé de proximité offrant des services médicaux de base.".to_string(),
            location: GeoPoint {
                lat: 14.7417,
                lng: -17.4589,
            },
            waiting_time: 20,
            rating: 3.8,
            opening_hours: weekdays("08:00 - 17:00", "08:00 - 16:00", "08:00 - 12:00", "Fermé"),
            price: 3000,
            capacity: "150 lits".to_string(),
        },
        Facility {
            id: 5,
            name: "Hôpital Régional de Thiès".to_string(),
            address: "Thiès, Sénégal".to_string(),
            phone: "+221 33 951 10 10".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Urgences",
                "Radiologie",
                "Laboratoire",
                "Chirurgie",
            ]),
            description: "Hôpital régional desservant la région de Thiès et ses environs."
                .to_string(),
            location: GeoPoint {
                lat: 14.7900,
                lng: -16.9256,
            },
            waiting_time: 40,
            rating: 4.1,
            opening_hours: weekdays("07:00 - 20:00", "07:00 - 19:00", "08:00 - 16:00", "Urgences uniquement"),
            price: 4500,
            capacity: "300 lits".to_string(),
        },
        Facility {
            id: 6,
            name: "Centre Médical de Mermoz".to_string(),
            address: "Mermoz, Dakar".to_string(),
            phone: "+221 33 860 60 60".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Dentiste",
                "Pédiatrie",
                "Gynécologie",
                "Analyse Médicale",
            ]),
            description: "Centre médical moderne offrant des consultations spécialisées."
                .to_string(),
            location: GeoPoint {
                lat: 14.7083,
                lng: -17.4697,
            },
            waiting_time: 25,
            rating: 4.3,
            opening_hours: weekdays("08:00 - 19:00", "08:00 - 18:00", "09:00 - 15:00", "Fermé"),
            price: 8000,
            capacity: "200 lits".to_string(),
        },
        Facility {
            id: 7,
            name: "Hôpital de l'Enfant de Diamniadio".to_string(),
            address: "Diamniadio, Dakar".to_string(),
            phone: "+221 33 855 55 55".to_string(),
            services: strings(&[
                "Pédiatrie",
                "Urgences Pédiatriques",
                "Vaccination",
                "Nutrition",
            ]),
            description: "Hôpital spécialisé dans les soins aux enfants et adolescents."
                .to_string(),
            location: GeoPoint {
                lat: 14.7139,
                lng: -17.4450,
            },
            waiting_time: 35,
            rating: 4.6,
            opening_hours: always_open(),
            price: 9000,
            capacity: "250 lits".to_string(),
        },
        Facility {
            id: 8,
            name: "Centre Hospitalier de Pikine".to_string(),
            address: "Pikine, Dakar".to_string(),
            phone: "+221 33 834 40 40".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Urgences",
                "Maternité",
                "Radiologie",
            ]),
            description: "Centre hospitalier de district desservant la banlieue de Dakar."
                .to_string(),
            location: GeoPoint {
                lat: 14.7500,
                lng: -17.4000,
            },
            waiting_time: 50,
            rating: 3.9,
            opening_hours: weekdays("08:00 - 20:00", "08:00 - 19:00", "09:00 - 17:00", "Urgences uniquement"),
            price: 3500,
            capacity: "180 lits".to_string(),
        },
        Facility {
            id: 9,
            name: "Polyclinique de la Madeleine".to_string(),
            address: "Plateau, Dakar".to_string(),
            phone: "+221 33 821 21 21".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Dentiste",
                "Ophtalmologie",
                "Dermatologie",
                "Kinésithérapie",
            ]),
            description:
                "Polyclinique privée conventionnée offrant des consultations spécialisées."
                    .to_string(),
            location: GeoPoint {
                lat: 14.6681,
                lng: -17.4303,
            },
            waiting_time: 15,
            rating: 4.4,
            opening_hours: weekdays("07:30 - 19:30", "07:30 - 18:30", "08:00 - 16:00", "Fermé"),
            price: 12000,
            capacity: "100 lits".to_string(),
        },
        Facility {
            id: 10,
            name: "Hôpital Militaire de Ouakam".to_string(),
            address: "Ouakam, Dakar".to_string(),
            phone: "+221 33 860 30 30".to_string(),
            services: strings(&[
                "Consultation Générale",
                "Urgences",
                "Chirurgie",
                "Imagerie Médicale",
            ]),
            description: "Hôpital militaire ouvert au public pour certaines consultations."
                .to_string(),
            location: GeoPoint {
                lat: 14.7222,
                lng: -17.4806,
            },
            waiting_time: 40,
            rating: 4.2,
            opening_hours: weekdays("08:00 - 18:00", "08:00 - 17:00", "09:00 - 13:00", "Urgences uniquement"),
            price: 6000,
            capacity: "320 lits".to_string(),
        },
    ]
}

/// The default service catalog
pub fn default_services() -> Vec<Service> {
    vec![
        Service {
            id: 1,
            name: "Consultation Générale".to_string(),
            price: 5000,
            duration: "30 min".to_string(),
        },
        Service {
            id: 2,
            name: "Urgences".to_string(),
            price: 10000,
            duration: "Immédiat".to_string(),
        },
        Service {
            id: 3,
            name: "Radiologie".to_string(),
            price: 25000,
            duration: "45 min".to_string(),
        },
        Service {
            id: 4,
            name: "Laboratoire".to_string(),
            price: 15000,
            duration: "20 min".to_string(),
        },
        Service {
            id: 5,
            name: "Pédiatrie".to_string(),
            price: 7000,
            duration: "40 min".to_string(),
        },
        Service {
            id: 6,
            name: "Ophtalmologie".to_string(),
            price: 12000,
            duration: "60 min".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_facility_ids_are_unique() {
        let facilities = default_facilities();
        let ids: HashSet<u32> = facilities.iter().map(|f| f.id).collect();
        assert_eq!(ids.len(), facilities.len());
    }

    #[test]
    fn test_service_ids_are_unique() {
        let services = default_services();
        let ids: HashSet<u32> = services.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), services.len());
    }

    #[test]
    fn test_every_facility_offers_something() {
        for facility in default_facilities() {
            assert!(!facility.services.is_empty(), "{}", facility.name);
            assert_eq!(facility.opening_hours.len(), 7, "{}", facility.name);
        }
    }
}
