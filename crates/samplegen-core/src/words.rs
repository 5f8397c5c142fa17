// Vocabulary for the built-in fakers.

pub const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Amara", "Ana", "Arjun", "Beatrice", "Bruno", "Carmen", "Chen", "Chloe",
    "Dario", "Devi", "Elena", "Emeka", "Erik", "Fatima", "Felix", "Grace", "Hana", "Hugo",
    "Ines", "Isaac", "Jamal", "Jin", "Julia", "Kai", "Kofi", "Lara", "Leon", "Lucia",
    "Malik", "Maya", "Mei", "Nadia", "Nikolai", "Noor", "Olga", "Omar", "Priya", "Rafael",
    "Rosa", "Sami", "Sofia", "Tariq", "Tomas", "Uma", "Victor", "Wen", "Yara", "Zoe",
];

pub const LAST_NAMES: &[&str] = &[
    "Abara", "Andersen", "Baptiste", "Bianchi", "Castillo", "Chowdhury", "Dimitrov", "Dubois",
    "Eriksen", "Fernandes", "Fischer", "Garcia", "Haddad", "Hoffmann", "Ito", "Jensen",
    "Kaur", "Kowalski", "Larsen", "Lopez", "Mensah", "Moreau", "Nakamura", "Novak",
    "Okafor", "Olsen", "Park", "Petrov", "Quinn", "Rossi", "Sato", "Schmidt",
    "Silva", "Tanaka", "Torres", "Ueda", "Varga", "Weber", "Xu", "Yilmaz", "Zhang",
];

pub const JOB_DESCRIPTORS: &[&str] = &[
    "Senior", "Lead", "Principal", "Junior", "Chief", "Regional", "Global", "Associate",
];

pub const JOB_AREAS: &[&str] = &[
    "Accounts", "Operations", "Marketing", "Compliance", "Research", "Security", "Logistics",
    "Finance", "Infrastructure", "Quality",
];

pub const JOB_TYPES: &[&str] = &[
    "Analyst", "Engineer", "Manager", "Officer", "Consultant", "Specialist", "Coordinator",
    "Administrator", "Architect", "Director",
];

pub const COMPANY_SUFFIXES: &[&str] = &["Ltd", "LLC", "Group", "Holdings", "and Sons", "Inc"];

pub const STREET_SUFFIXES: &[&str] = &[
    "Street", "Road", "Avenue", "Lane", "Way", "Close", "Gardens", "Terrace", "Place",
];

pub const CITIES: &[&str] = &[
    "London", "Manchester", "Bristol", "Edinburgh", "New York", "Boston", "Berlin", "Hamburg",
    "Paris", "Lyon", "Auckland", "Wellington", "Singapore",
];

pub const COUNTRIES: &[&str] = &[
    "United Kingdom", "United States", "Germany", "France", "New Zealand", "Singapore",
];

pub const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "mail.test", "inbox.test"];

pub const TLDS: &[&str] = &["com", "org", "net", "io", "co.uk"];

pub const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
    "enim", "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris",
    "nisi", "aliquip", "ex", "ea", "commodo", "consequat",
];

pub const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
