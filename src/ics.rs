use ics::{
    properties::{Description, DtEnd, DtStart, Location, Organizer, RRule, Status, Summary, TzName},
    Daylight, Standard, TimeZone,
};

use crate::model::{self, SchedulePlan, Session};

impl SchedulePlan {
    #[must_use]
    pub fn to_ics(&self) -> ics::ICalendar<'_> {
        let mut cet_standard = Standard::new("19701025T030000", "+0200", "+0100");
        cet_standard.push(TzName::new("CET"));
        cet_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU"));

        let mut cest_daylight = Daylight::new("19700329T020000", "+0100", "+0200");
        cest_daylight.push(TzName::new("CEST"));
        cest_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU"));

        let mut timezone = TimeZone::daylight("Europe/Paris", cest_daylight);
        timezone.add_standard(cet_standard);

        let mut icalendar = ics::ICalendar::new("2.0", &self.title);
        icalendar.add_timezone(timezone);

        for session in &self.sessions {
            icalendar.add_event(session.to_ics());
        }

        icalendar
    }
}

impl Session {
    #[must_use]
    pub fn to_ics(&self) -> ics::Event<'_> {
        let start = format!(
            "{}T{}00",
            self.date.format("%Y%m%d"),
            self.start.format("%H%M")
        );

        let end = format!(
            "{}T{}00",
            self.date.format("%Y%m%d"),
            self.end.format("%H%M")
        );

        let id = format!("seance-{}@{}", self.id, start);

        let mut ics_event = ics::Event::new(id, start.clone());

        ics_event.push(DtStart::new(start));
        ics_event.push(DtEnd::new(end));
        ics_event.push(Summary::new(self.course_label()));

        if let Some(room) = self.room.as_ref().and_then(model::Room::label) {
            ics_event.push(Location::new(room));
        }

        if let Some(teacher) = &self.teacher {
            ics_event.push(Organizer::new(teacher.name()));
        }

        ics_event.push(Description::new(self.status.wire_name()));

        match self.status {
            model::Status::Cancelled => ics_event.push(Status::cancelled()),
            model::Status::Postponed => ics_event.push(Status::tentative()),
            model::Status::Planned | model::Status::Done => ics_event.push(Status::confirmed()),
        }

        ics_event
    }
}
